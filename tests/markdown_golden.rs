
use termfolio::{strip_escapes, visible_width, MarkdownRenderer, Theme};

fn render_markdown(input_fixture: &str, width: usize, streaming: bool) -> Vec<String> {
    let input = fixture::read_fixture(input_fixture);
    let renderer = MarkdownRenderer::with_width(Theme::plain().markdown_theme(), width);
    renderer
        .render(&input, streaming)
        .into_iter()
        .map(|line| line.trim_end().to_string())
        .collect()
}

fn assert_markdown_fixture(input_fixture: &str, expected_fixture: &str, width: usize, streaming: bool) {
    let actual = render_markdown(input_fixture, width, streaming);
    let expected = fixture::read_lines(expected_fixture);
    assert_eq!(
        actual, expected,
        "markdown golden mismatch for {input_fixture} at width={width}"
    );
}

#[test]
fn markdown_mixed_blocks_golden() {
    assert_markdown_fixture("markdown_mixed.md", "markdown_mixed.txt", 40, false);
}

#[test]
fn markdown_table_golden() {
    assert_markdown_fixture("markdown_table.md", "markdown_table.txt", 40, false);
}

#[test]
fn markdown_streaming_fence_golden() {
    assert_markdown_fixture(
        "markdown_streaming_fence.md",
        "markdown_streaming_fence.txt",
        30,
        true,
    );
}

#[test]
fn styled_render_matches_plain_render_once_escapes_are_stripped() {
    let input = fixture::read_fixture("markdown_mixed.md");
    let plain = MarkdownRenderer::with_width(Theme::plain().markdown_theme(), 40);
    let styled = MarkdownRenderer::with_width(Theme::cyberpunk().markdown_theme(), 40);

    let plain_lines = plain.render(&input, false);
    let styled_lines = styled.render(&input, false);
    assert_eq!(plain_lines.len(), styled_lines.len());
    for (plain, styled) in plain_lines.iter().zip(styled_lines.iter()) {
        assert_eq!(plain.trim_end(), strip_escapes(styled).trim_end());
        assert!(visible_width(styled) <= 36);
    }
}

#[test]
fn streaming_prefixes_never_exceed_width() {
    let input = fixture::read_fixture("markdown_mixed.md");
    let renderer = MarkdownRenderer::with_width(Theme::cyberpunk().markdown_theme(), 24);
    let mut end = 0;
    while end <= input.len() {
        if input.is_char_boundary(end) {
            for line in renderer.render(&input[..end], true) {
                assert!(visible_width(&line) <= 20, "{line:?} exceeds width");
            }
        }
        end += 1;
    }
}

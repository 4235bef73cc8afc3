//! Markdown rendering into styled, width-bounded terminal lines.
//!
//! Input is parsed with GFM options into an mdast and every block is laid
//! out against the content width (`width - 4`). Headings, code lines and
//! table cells are truncated; paragraphs, list items and quotes are wrapped.
//! The renderer keeps no state besides its theme and width, so the same
//! `(text, width, streaming)` always renders the same lines.

use markdown::{mdast, to_mdast, ParseOptions};

use crate::core::text::utils::{center_padded, pad_to_width, truncate_to_width};
use crate::core::text::width::visible_width;
use crate::core::text::wrap::wrap_text_with_ansi;

pub type MarkdownStyleFn = Box<dyn Fn(&str) -> String + Send + Sync>;

pub struct MarkdownTheme {
    /// Levels 1, 2, 3 and 4+; applied to the decorated heading text.
    pub headings: [MarkdownStyleFn; 4],
    pub link: MarkdownStyleFn,
    pub link_url: MarkdownStyleFn,
    pub code: MarkdownStyleFn,
    pub code_delimiter: MarkdownStyleFn,
    pub code_block: MarkdownStyleFn,
    pub code_block_border: MarkdownStyleFn,
    pub code_block_lang: MarkdownStyleFn,
    pub quote: MarkdownStyleFn,
    pub quote_border: MarkdownStyleFn,
    pub hr: MarkdownStyleFn,
    pub bullet: MarkdownStyleFn,
    pub nested_bullet: MarkdownStyleFn,
    pub ordered_bullet: MarkdownStyleFn,
    pub bold: MarkdownStyleFn,
    pub italic: MarkdownStyleFn,
    pub strikethrough: MarkdownStyleFn,
    pub table_border: MarkdownStyleFn,
    pub table_header: MarkdownStyleFn,
    /// Alternating styles for body rows.
    pub table_cell: [MarkdownStyleFn; 2],
}

#[derive(Clone, Copy)]
enum InlineStyleKind {
    Default,
    Quote,
}

struct InlineStyleContext {
    kind: InlineStyleKind,
    style_prefix: String,
}

const MIN_CELL_WIDTH: usize = 3;
const RULE_MAX: usize = 44;
const CODE_BORDER_MAX: usize = 40;
const CODE_BORDER_MIN: usize = 10;

pub struct MarkdownRenderer {
    theme: MarkdownTheme,
    width: usize,
}

impl MarkdownRenderer {
    pub const DEFAULT_WIDTH: usize = 80;
    pub const MIN_WIDTH: usize = 20;

    pub fn new(theme: MarkdownTheme) -> Self {
        Self {
            theme,
            width: Self::DEFAULT_WIDTH,
        }
    }

    pub fn with_width(theme: MarkdownTheme, width: usize) -> Self {
        let mut renderer = Self::new(theme);
        renderer.set_width(width);
        renderer
    }

    /// Widths below [`Self::MIN_WIDTH`] are ignored.
    pub fn set_width(&mut self, width: usize) {
        if width >= Self::MIN_WIDTH {
            self.width = width;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Column budget for rendered lines.
    pub fn content_width(&self) -> usize {
        self.width - 4
    }

    /// Renders `text` into lines no wider than [`Self::content_width`].
    ///
    /// With `streaming` set, an unterminated trailing code fence is drawn as
    /// an open block: its body is code styled and the closing border is left
    /// off until the fence arrives.
    pub fn render(&self, text: &str, streaming: bool) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let width = self.content_width();
        let normalized = text.replace('\t', "   ");
        let open_fence = streaming && has_unterminated_fence(&normalized);

        let root = match to_mdast(&normalized, &ParseOptions::gfm()) {
            Ok(node) => node,
            Err(_) => mdast::Node::Text(mdast::Text {
                value: normalized.clone(),
                position: None,
            }),
        };
        let nodes = match root {
            mdast::Node::Root(root) => root.children,
            other => vec![other],
        };

        let mut rendered = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            let next = nodes.get(idx + 1);
            let space_after = match (node_position(node), next.and_then(node_position)) {
                (Some((end, _)), Some((_, next_start))) => {
                    has_blank_line_between(&normalized, end, next_start)
                }
                _ => false,
            };
            let open = open_fence && idx + 1 == nodes.len();
            let raw = raw_slice(node, &normalized);

            rendered.extend(self.render_node(node, width, raw, open));
            if space_after {
                rendered.push(String::new());
            }
        }

        rendered
            .iter()
            .flat_map(|line| wrap_text_with_ansi(line, width))
            .collect()
    }

    fn render_node(
        &self,
        node: &mdast::Node,
        width: usize,
        raw: Option<&str>,
        open: bool,
    ) -> Vec<String> {
        match node {
            mdast::Node::Heading(heading) => {
                let context = default_context();
                let text = self.render_inline_nodes(&heading.children, &context);
                let (decorated, level) = match heading.depth {
                    1 => (format!("═══ {text} ═══"), 0),
                    2 => (format!("◈ {text}"), 1),
                    3 => (format!("◆ {text}"), 2),
                    _ => (format!("▸ {text}"), 3),
                };
                vec![truncate_to_width(
                    &(self.theme.headings[level])(&decorated),
                    width,
                )]
            }
            mdast::Node::Paragraph(paragraph) => {
                let context = default_context();
                vec![self.render_inline_nodes(&paragraph.children, &context)]
            }
            mdast::Node::Code(code) => self.render_code(code, width, open),
            mdast::Node::List(list) => self.render_list(list, 0, width),
            mdast::Node::Blockquote(blockquote) => self.render_blockquote(blockquote, width),
            mdast::Node::ThematicBreak(_) => {
                vec![(self.theme.hr)(&"─".repeat(width.min(RULE_MAX)))]
            }
            mdast::Node::Table(table) => self.render_table(table, width, raw),
            mdast::Node::Html(html) => vec![html.value.trim().to_string()],
            mdast::Node::Text(text) => vec![text.value.clone()],
            _ => Vec::new(),
        }
    }

    fn apply_inline_style(&self, text: &str, kind: InlineStyleKind) -> String {
        match kind {
            InlineStyleKind::Default => text.to_string(),
            InlineStyleKind::Quote => text
                .split('\n')
                .map(|segment| (self.theme.quote)(segment))
                .collect::<Vec<String>>()
                .join("\n"),
        }
    }

    fn render_inline_nodes(&self, nodes: &[mdast::Node], context: &InlineStyleContext) -> String {
        let style_prefix = context.style_prefix.as_str();
        let kind = context.kind;
        let mut result = String::new();

        for node in nodes {
            match node {
                mdast::Node::Text(text) => {
                    result.push_str(&self.apply_inline_style(&text.value, kind));
                }
                mdast::Node::Paragraph(paragraph) => {
                    result.push_str(&self.render_inline_nodes(&paragraph.children, context));
                }
                mdast::Node::Strong(strong) => {
                    let content = self.render_inline_nodes(&strong.children, context);
                    result.push_str(&(self.theme.bold)(&content));
                    result.push_str(style_prefix);
                }
                mdast::Node::Emphasis(emphasis) => {
                    let content = self.render_inline_nodes(&emphasis.children, context);
                    result.push_str(&(self.theme.italic)(&content));
                    result.push_str(style_prefix);
                }
                mdast::Node::Delete(delete) => {
                    let content = self.render_inline_nodes(&delete.children, context);
                    result.push_str(&(self.theme.strikethrough)(&content));
                    result.push_str(style_prefix);
                }
                mdast::Node::InlineCode(code) => {
                    result.push_str(&(self.theme.code_delimiter)("⟨"));
                    result.push_str(&(self.theme.code)(&code.value));
                    result.push_str(&(self.theme.code_delimiter)("⟩"));
                    result.push_str(style_prefix);
                }
                mdast::Node::Link(link) => {
                    let label = self.render_inline_nodes(&link.children, context);
                    let label_plain = plain_text_from_nodes(&link.children);
                    let href = link.url.as_str();
                    let href_cmp = href.strip_prefix("mailto:").unwrap_or(href);
                    result.push_str(&(self.theme.link)(&label));
                    if label_plain != href && label_plain != href_cmp {
                        result.push_str(&(self.theme.link_url)(&format!(" ({href})")));
                    }
                    result.push_str(style_prefix);
                }
                mdast::Node::Break(_) => result.push('\n'),
                mdast::Node::Html(html) => {
                    result.push_str(&self.apply_inline_style(&html.value, kind));
                }
                mdast::Node::Image(image) => {
                    let alt = if image.alt.is_empty() {
                        image.url.as_str()
                    } else {
                        image.alt.as_str()
                    };
                    result.push_str(&self.apply_inline_style(alt, kind));
                }
                _ => {}
            }
        }

        result
    }

    fn render_list(&self, list: &mdast::List, depth: usize, width: usize) -> Vec<String> {
        let indent = "  ".repeat(depth + 1);
        let start = list.start.unwrap_or(1);
        let bullet_style = if list.ordered {
            &self.theme.ordered_bullet
        } else if depth == 0 {
            &self.theme.bullet
        } else {
            &self.theme.nested_bullet
        };

        let mut lines = Vec::new();
        for (idx, node) in list.children.iter().enumerate() {
            let mdast::Node::ListItem(item) = node else {
                continue;
            };

            let mut marker = if list.ordered {
                format!("{}. ", start as usize + idx)
            } else if depth == 0 {
                "▹ ".to_string()
            } else {
                "◦ ".to_string()
            };
            match item.checked {
                Some(true) => marker.push_str("[x] "),
                Some(false) => marker.push_str("[ ] "),
                None => {}
            }

            let hang = indent.len() + visible_width(&marker);
            let text_width = width.saturating_sub(hang).max(1);
            let bullet_line = format!("{indent}{}", bullet_style(&marker));
            let continuation = " ".repeat(hang);

            // (line, already indented by a nested list)
            let mut body: Vec<(String, bool)> = Vec::new();
            for child in &item.children {
                match child {
                    mdast::Node::List(nested) => body.extend(
                        self.render_list(nested, depth + 1, width)
                            .into_iter()
                            .map(|line| (line, true)),
                    ),
                    mdast::Node::Code(code) => body.extend(
                        self.render_code(code, text_width, false)
                            .into_iter()
                            .map(|line| (line, false)),
                    ),
                    other => {
                        let context = default_context();
                        let text = self.render_inline_nodes(std::slice::from_ref(other), &context);
                        body.extend(
                            wrap_text_with_ansi(&text, text_width)
                                .into_iter()
                                .map(|line| (line, false)),
                        );
                    }
                }
            }

            let mut bullet_used = false;
            for (line, nested) in body {
                if nested {
                    if !bullet_used {
                        lines.push(bullet_line.clone());
                        bullet_used = true;
                    }
                    lines.push(line);
                } else if !bullet_used {
                    lines.push(format!("{bullet_line}{line}"));
                    bullet_used = true;
                } else {
                    lines.push(format!("{continuation}{line}"));
                }
            }
            if !bullet_used {
                lines.push(bullet_line);
            }
        }

        lines
    }

    fn render_blockquote(&self, blockquote: &mdast::Blockquote, width: usize) -> Vec<String> {
        let context = InlineStyleContext {
            kind: InlineStyleKind::Quote,
            style_prefix: style_prefix(&self.theme.quote),
        };
        let inner_width = width.saturating_sub(2).max(1);

        let mut lines = Vec::new();
        for child in &blockquote.children {
            match child {
                mdast::Node::Paragraph(paragraph) => {
                    let text = self.render_inline_nodes(&paragraph.children, &context);
                    lines.extend(wrap_text_with_ansi(&text, inner_width));
                }
                other => {
                    for line in self.render_node(other, inner_width, None, false) {
                        lines.extend(wrap_text_with_ansi(&line, inner_width));
                    }
                }
            }
        }

        let border = (self.theme.quote_border)("┃ ");
        lines
            .into_iter()
            .map(|line| format!("{border}{line}"))
            .collect()
    }

    fn render_code(&self, code: &mdast::Code, width: usize, open: bool) -> Vec<String> {
        let border = &self.theme.code_block_border;
        let mut top = border("┌─");
        let mut border_len = width.saturating_sub(4).min(CODE_BORDER_MAX);
        if let Some(lang) = code.lang.as_deref().filter(|lang| !lang.is_empty()) {
            top.push_str(&(self.theme.code_block_lang)(&format!(" {lang} ")));
            border_len = border_len.saturating_sub(visible_width(lang) + 2);
        }
        top.push_str(&border(&"─".repeat(border_len.max(CODE_BORDER_MIN))));

        let mut lines = vec![truncate_to_width(&top, width)];
        let body_width = width.saturating_sub(2).max(1);
        if !code.value.is_empty() {
            let gutter = border("│ ");
            for line in code.value.split('\n') {
                let fitted = truncate_to_width(line, body_width);
                lines.push(format!("{gutter}{}", (self.theme.code_block)(&fitted)));
            }
        }
        if !open {
            let rule = "─".repeat(width.min(RULE_MAX).saturating_sub(1));
            lines.push(border(&format!("└{rule}")));
        }
        lines
    }

    fn render_table(&self, table: &mdast::Table, width: usize, raw: Option<&str>) -> Vec<String> {
        let rows: Vec<Vec<String>> = table
            .children
            .iter()
            .filter_map(|node| match node {
                mdast::Node::TableRow(row) => Some(
                    row.children
                        .iter()
                        .map(|cell| self.render_cell_text(cell))
                        .collect(),
                ),
                _ => None,
            })
            .collect();

        let Some(num_cols) = rows.first().map(Vec::len).filter(|cols| *cols > 0) else {
            return Vec::new();
        };

        let available = width.saturating_sub(3 * num_cols + 1);
        if available < num_cols * MIN_CELL_WIDTH {
            return raw
                .map(|raw| wrap_text_with_ansi(raw, width))
                .unwrap_or_default();
        }

        let mut natural = vec![MIN_CELL_WIDTH; num_cols];
        for row in &rows {
            for (col, cell) in row.iter().take(num_cols).enumerate() {
                natural[col] = natural[col].max(visible_width(cell));
            }
        }
        let widths = fit_column_widths(&natural, available);

        let border = &self.theme.table_border;
        let rule = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            border(&format!("{left}─{}─{right}", cells.join(&format!("─{mid}─"))))
        };
        let bar = border("│");
        let row_line = |row: &[String], style: &MarkdownStyleFn| {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(col, cell_width)| {
                    let text = row.get(col).map(String::as_str).unwrap_or("");
                    let align = table.align.get(col).cloned().unwrap_or(mdast::AlignKind::None);
                    style(&fit_cell(text, *cell_width, align))
                })
                .collect();
            format!("{bar} {} {bar}", cells.join(&format!(" {bar} ")))
        };

        let mut lines = vec![rule("┌", "┬", "┐")];
        lines.push(row_line(&rows[0], &self.theme.table_header));
        lines.push(rule("├", "┼", "┤"));
        for (idx, row) in rows.iter().skip(1).enumerate() {
            lines.push(row_line(row, &self.theme.table_cell[idx % 2]));
        }
        lines.push(rule("└", "┴", "┘"));
        lines
    }

    fn render_cell_text(&self, cell: &mdast::Node) -> String {
        let context = default_context();
        let text = match cell {
            mdast::Node::TableCell(table_cell) => {
                self.render_inline_nodes(&table_cell.children, &context)
            }
            other => self.render_inline_nodes(std::slice::from_ref(other), &context),
        };
        text.replace('\n', " ")
    }
}

fn default_context() -> InlineStyleContext {
    InlineStyleContext {
        kind: InlineStyleKind::Default,
        style_prefix: String::new(),
    }
}

/// Escape sequences a style emits before its text, used to restore the
/// surrounding style after a nested inline element closes.
fn style_prefix(style: &MarkdownStyleFn) -> String {
    let sentinel = "\u{0000}";
    let styled = style(sentinel);
    styled
        .find(sentinel)
        .map(|idx| styled[..idx].to_string())
        .unwrap_or_default()
}

/// Shrinks the widest columns first until the row fits `available` columns.
/// Callers guarantee `available >= natural.len() * MIN_CELL_WIDTH`.
fn fit_column_widths(natural: &[usize], available: usize) -> Vec<usize> {
    if natural.iter().sum::<usize>() <= available {
        return natural.to_vec();
    }

    let fits = |cap: usize| natural.iter().map(|w| (*w).min(cap)).sum::<usize>() <= available;
    let mut lo = MIN_CELL_WIDTH;
    let mut hi = natural.iter().copied().max().unwrap_or(MIN_CELL_WIDTH);
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    let mut widths: Vec<usize> = natural.iter().map(|w| (*w).min(lo)).collect();
    let mut leftover = available.saturating_sub(widths.iter().sum());
    for (width, natural) in widths.iter_mut().zip(natural) {
        if leftover == 0 {
            break;
        }
        if *width < *natural {
            *width += 1;
            leftover -= 1;
        }
    }
    widths
}

fn fit_cell(text: &str, width: usize, align: mdast::AlignKind) -> String {
    let fitted = if visible_width(text) > width {
        truncate_to_width(text, width)
    } else {
        text.to_string()
    };
    match align {
        mdast::AlignKind::Center => center_padded(&fitted, width),
        mdast::AlignKind::Right => {
            let missing = width.saturating_sub(visible_width(&fitted));
            format!("{}{fitted}", " ".repeat(missing))
        }
        mdast::AlignKind::Left | mdast::AlignKind::None => pad_to_width(&fitted, width),
    }
}

/// True when the last code fence opened in `text` has no closing fence.
fn has_unterminated_fence(text: &str) -> bool {
    let mut open: Option<(char, usize)> = None;
    for line in text.lines() {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            continue;
        }
        let Some(marker) = trimmed.chars().next().filter(|ch| *ch == '`' || *ch == '~') else {
            continue;
        };
        let run = trimmed.chars().take_while(|ch| *ch == marker).count();
        if run < 3 {
            continue;
        }
        match open {
            None => open = Some((marker, run)),
            Some((open_marker, open_run))
                if open_marker == marker && run >= open_run && trimmed[run..].trim().is_empty() =>
            {
                open = None;
            }
            Some(_) => {}
        }
    }
    open.is_some()
}

fn plain_text_from_nodes(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::Strong(strong) => out.push_str(&plain_text_from_nodes(&strong.children)),
            mdast::Node::Emphasis(emphasis) => {
                out.push_str(&plain_text_from_nodes(&emphasis.children))
            }
            mdast::Node::Delete(delete) => out.push_str(&plain_text_from_nodes(&delete.children)),
            mdast::Node::Link(link) => out.push_str(&plain_text_from_nodes(&link.children)),
            mdast::Node::Image(image) => out.push_str(&image.alt),
            _ => {}
        }
    }
    out
}

fn node_position(node: &mdast::Node) -> Option<(usize, usize)> {
    let position = match node {
        mdast::Node::Heading(heading) => heading.position.as_ref(),
        mdast::Node::Paragraph(paragraph) => paragraph.position.as_ref(),
        mdast::Node::Code(code) => code.position.as_ref(),
        mdast::Node::List(list) => list.position.as_ref(),
        mdast::Node::Blockquote(blockquote) => blockquote.position.as_ref(),
        mdast::Node::ThematicBreak(thematic) => thematic.position.as_ref(),
        mdast::Node::Html(html) => html.position.as_ref(),
        mdast::Node::Table(table) => table.position.as_ref(),
        _ => None,
    };
    position.map(|pos| (pos.end.offset, pos.start.offset))
}

fn raw_slice<'a>(node: &mdast::Node, source: &'a str) -> Option<&'a str> {
    let mdast::Node::Table(table) = node else {
        return None;
    };
    let position = table.position.as_ref()?;
    source
        .get(position.start.offset..position.end.offset)
        .filter(|raw| !raw.is_empty())
}

fn has_blank_line_between(source: &str, end: usize, start: usize) -> bool {
    if start <= end || end >= source.len() {
        return false;
    }
    let Some(slice) = source.get(end..start.min(source.len())) else {
        return false;
    };
    let mut saw_newline = false;
    let mut only_whitespace = true;

    for ch in slice.chars() {
        if ch == '\n' || ch == '\r' {
            if saw_newline && only_whitespace {
                return true;
            }
            saw_newline = true;
            only_whitespace = true;
        } else if !ch.is_whitespace() {
            saw_newline = false;
            only_whitespace = false;
        }
    }

    false
}

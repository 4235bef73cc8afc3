//! Frame chrome: the double-line border, header, footer and the escape
//! sequences that put a frame on the client's screen.

use termfolio::{center_padded, truncate_padded, visible_width, Style, Theme};
use unicode_segmentation::UnicodeSegmentation;

use crate::views::input_placeholder;

pub const SITE_NAME: &str = "MOHAK.SH";

pub const HEADER_ROWS: usize = 3;
pub const FOOTER_ROWS: usize = 5;

/// Alternate screen, bracketed paste, hidden cursor and SGR mouse reporting.
pub const ENTER_SCREEN: &str = "\x1b[?1049h\x1b[?2004h\x1b[?25l\x1b[?1000h\x1b[?1006h\x1b[2J";
pub const RESTORE_SCREEN: &str = "\x1b[?1006l\x1b[?1000l\x1b[?25h\x1b[?2004l\x1b[?1049l";
pub const MOUSE_ON: &str = "\x1b[?1000h\x1b[?1006h";
pub const MOUSE_OFF: &str = "\x1b[?1006l\x1b[?1000l";
/// Asks the terminal to report its size as `CSI 8;rows;cols t`.
pub const WINDOW_SIZE_QUERY: &str = "\x1b[18t";

/// Bottom line of the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint<'a> {
    Error(&'a str),
    Status(&'a str),
    Streaming,
    Navigate,
    Chat,
}

pub fn mouse_mode(enabled: bool) -> &'static str {
    if enabled {
        MOUSE_ON
    } else {
        MOUSE_OFF
    }
}

/// Content rows left between header and footer.
pub fn content_rows(height: usize) -> usize {
    height.saturating_sub(HEADER_ROWS + FOOTER_ROWS).max(1)
}

fn inner_width(width: usize) -> usize {
    width.saturating_sub(4)
}

fn rule(left: &str, fill: &str, right: &str, width: usize, edge: Style, line: Style) -> String {
    format!(
        "{}{}{}",
        edge.paint(left),
        line.paint(&fill.repeat(width.saturating_sub(2))),
        edge.paint(right)
    )
}

fn framed(text: &str, width: usize, border: Style) -> String {
    format!(
        "{}{}{}",
        border.paint("║ "),
        truncate_padded(text, inner_width(width)),
        border.paint(" ║")
    )
}

pub fn header(width: usize, tag: &str, streaming: bool, theme: &Theme) -> Vec<String> {
    let inner = inner_width(width);
    let logo = format!(
        "{}{}{}",
        theme.neon.paint("▓▒░ "),
        theme.neon.bold().paint(SITE_NAME),
        theme.neon.paint(" ░▒▓")
    );
    let tag = theme.cyan.bold().paint(&format!("[{tag}]"));
    let status = if streaming {
        theme.neon.paint("◉ STREAMING")
    } else {
        theme.green.paint("◉ ONLINE")
    };

    let used = visible_width(&logo) + visible_width(&tag) + visible_width(&status);
    let left_gap = (inner.saturating_sub(used) / 2).saturating_sub(2).max(1);
    let right_gap = inner
        .saturating_sub(used + left_gap)
        .max(1);
    let title = format!(
        "{logo}{}{tag}{}{status}",
        " ".repeat(left_gap),
        " ".repeat(right_gap)
    );

    vec![
        rule("╔", "═", "╗", width, theme.yellow, theme.muted),
        framed(&title, width, theme.muted),
        rule("╠", "═", "╣", width, theme.muted, theme.muted),
    ]
}

pub fn content_row(line: &str, width: usize, theme: &Theme) -> String {
    framed(line, width, theme.dim)
}

/// Rightmost part of `input` that fits in `width` columns.
fn input_tail(input: &str, width: usize) -> String {
    if visible_width(input) <= width {
        return input.to_string();
    }
    let mut used = 0;
    let mut start = input.len();
    for (index, grapheme) in input.grapheme_indices(true).rev() {
        let cols = visible_width(grapheme);
        if used + cols > width {
            break;
        }
        used += cols;
        start = index;
    }
    input[start..].to_string()
}

fn hint_text(hint: Hint<'_>, theme: &Theme) -> String {
    match hint {
        Hint::Error(message) => theme.red.bold().paint("⚠ ERR: ") + &theme.red.paint(message),
        Hint::Status(message) => theme.green.paint("✓ ") + &theme.green.paint(message),
        Hint::Streaming => {
            theme.neon.paint("▓▒░ ") + &theme.muted.paint("receiving... ESC to interrupt")
        }
        Hint::Navigate => theme.muted.paint("ESC back │ ↑↓ scroll │ ^/ help │ ^Q quit"),
        Hint::Chat => theme.muted.paint("type to chat │ /help commands │ ^/ help │ ^Q quit"),
    }
}

pub fn footer(width: usize, input: &str, hint: Hint<'_>, theme: &Theme) -> Vec<String> {
    let inner = inner_width(width);
    let prompt = theme.yellow.bold().paint("❯ ");
    let cursor = theme.neon.paint("▌");
    let available = inner.saturating_sub(3);
    let input_line = if input.is_empty() {
        format!("{prompt}{cursor}{}", theme.dim.paint(input_placeholder()))
    } else {
        format!(
            "{prompt}{}{cursor}",
            theme.body.paint(&input_tail(input, available))
        )
    };

    vec![
        rule("╠", "═", "╣", width, theme.muted, theme.muted),
        framed(&input_line, width, theme.muted),
        rule("╟", "─", "╢", width, theme.muted, theme.dim),
        framed(&hint_text(hint, theme), width, theme.muted),
        rule("╚", "═", "╝", width, theme.yellow, theme.muted),
    ]
}

/// Last frame shown before the connection closes.
pub fn farewell(width: usize, theme: &Theme) -> Vec<String> {
    let inner = inner_width(width);
    vec![
        String::new(),
        rule("╔", "═", "╗", width, theme.neon, theme.neon),
        format!(
            "{}{}{}",
            theme.neon.paint("║ "),
            center_padded(&theme.yellow.bold().paint("CONNECTION TERMINATED"), inner),
            theme.neon.paint(" ║")
        ),
        format!(
            "{}{}{}",
            theme.neon.paint("║ "),
            center_padded(&theme.muted.paint("// session ended"), inner),
            theme.neon.paint(" ║")
        ),
        rule("╚", "═", "╝", width, theme.neon, theme.neon),
        String::new(),
    ]
}

/// Homes the cursor, overwrites each row, and clears whatever the previous
/// frame left below.
pub fn encode_frame(rows: &[String]) -> String {
    let mut out = String::from("\x1b[H");
    out.push_str(&rows.join("\x1b[K\r\n"));
    out.push_str("\x1b[K\x1b[J");
    out
}

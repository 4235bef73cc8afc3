//! Truncation, padding, and centering on visible columns.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_at, next_escape_or_end};
use super::width::{grapheme_width, visible_width};

pub const ELLIPSIS: &str = "...";
const ANSI_RESET: &str = "\x1b[0m";

/// Truncates `text` to `max_width` columns, ending in [`ELLIPSIS`].
///
/// Widths of 3 or less leave room for nothing but the marker, so the marker
/// alone is returned. Otherwise a full reset precedes the marker so an open
/// style never leaks past the cut.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    truncate_with(text, max_width, ELLIPSIS, false)
}

/// [`truncate_to_width`] followed by right padding to exactly `max_width` columns.
pub fn truncate_padded(text: &str, max_width: usize) -> String {
    truncate_with(text, max_width, ELLIPSIS, true)
}

pub fn truncate_with(text: &str, max_width: usize, ellipsis: &str, pad: bool) -> String {
    let ellipsis_width = visible_width(ellipsis);
    if max_width <= ellipsis_width {
        return ellipsis.to_string();
    }

    let text_width = visible_width(text);
    if text_width <= max_width {
        return if pad {
            pad_to_width(text, max_width)
        } else {
            text.to_string()
        };
    }

    let target = max_width - ellipsis_width;
    let mut out = String::with_capacity(text.len() + ANSI_RESET.len() + ellipsis.len());
    let mut used = 0;
    let mut idx = 0;

    'scan: while idx < text.len() {
        if let Some(seq) = escape_at(text, idx) {
            out.push_str(seq.text);
            idx += seq.len();
            continue;
        }

        let end = next_escape_or_end(text, idx);
        for grapheme in text[idx..end].graphemes(true) {
            let cols = grapheme_width(grapheme);
            if used + cols > target {
                break 'scan;
            }
            out.push_str(grapheme);
            used += cols;
        }
        idx = end;
    }

    out.push_str(ANSI_RESET);
    out.push_str(ellipsis);
    if pad {
        out = pad_to_width(&out, max_width);
    }
    out
}

/// Right pads with spaces up to `width` visible columns. Never truncates.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let missing = width.saturating_sub(visible_width(text));
    let mut out = String::with_capacity(text.len() + missing);
    out.push_str(text);
    out.extend(std::iter::repeat(' ').take(missing));
    out
}

/// Left pads so `text` sits in the middle of `width` columns. Text that does
/// not fit is returned unchanged.
pub fn center(text: &str, width: usize) -> String {
    let text_width = visible_width(text);
    if text_width >= width {
        return text.to_string();
    }
    format!("{}{text}", " ".repeat((width - text_width) / 2))
}

/// Centers and pads on both sides to exactly `width` columns.
pub fn center_padded(text: &str, width: usize) -> String {
    pad_to_width(&center(text, width), width)
}

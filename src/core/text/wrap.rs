//! Word wrapping for styled text.
//!
//! Wrapping operates on whole tokens (runs of spaces or non-spaces with their
//! attached escape sequences), so an escape sequence is never split across
//! lines. Active SGR state is re-opened at the start of every continuation
//! line.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{escape_at, next_escape_or_end, strip_escapes, SgrState};
use super::width::{grapheme_width, visible_width};

/// Wraps `text` to `width` columns. Always returns at least one line.
///
/// A grapheme wider than `width` cannot be split, so it gets a line of its
/// own. At `width == 1` that means a double-width glyph overflows by one
/// column; every wider `width` is exact.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut carried = SgrState::default();

    for source_line in text.split('\n') {
        let prefixed = if lines.is_empty() {
            source_line.to_string()
        } else {
            format!("{}{source_line}", carried.reopen())
        };
        lines.extend(wrap_line(&prefixed, width));
        carried.apply_all(source_line);
    }

    lines
        .into_iter()
        .map(|line| line.trim_end_matches(' ').to_string())
        .collect()
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut state = SgrState::default();
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for token in tokenize(line) {
        let token_width = visible_width(&token);
        let is_space = strip_escapes(&token).chars().all(|ch| ch == ' ');

        if is_space {
            let overflows = current_width + token_width > width;
            if overflows && current_width > 0 {
                wrapped.push(close_line(&current, &state));
                current = state.reopen();
                current_width = 0;
            }
            // Indentation survives only at the start of the source line.
            if overflows || (current_width == 0 && !wrapped.is_empty()) {
                current.push_str(&escapes_only(&token));
            } else {
                current.push_str(&token);
                current_width += token_width;
            }
            state.apply_all(&token);
            continue;
        }

        if token_width > width {
            if current_width > 0 {
                wrapped.push(close_line(&current, &state));
            }
            let mut pieces = split_long_token(&token, width, &mut state);
            current = pieces.pop().unwrap_or_default();
            current_width = visible_width(&current);
            wrapped.extend(pieces);
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            wrapped.push(close_line(&current, &state));
            current = state.reopen();
            current_width = 0;
        }
        current.push_str(&token);
        current_width += token_width;
        state.apply_all(&token);
    }

    if current_width > 0 || wrapped.is_empty() {
        wrapped.push(current);
    } else if let Some(last) = wrapped.last_mut() {
        last.push_str(&escapes_only(&current));
    }
    wrapped
}

fn close_line(line: &str, state: &SgrState) -> String {
    let mut closed = line.trim_end_matches(' ').to_string();
    closed.push_str(state.break_reset());
    closed
}

fn escapes_only(token: &str) -> String {
    let mut out = String::new();
    let mut idx = 0;
    while idx < token.len() {
        if let Some(seq) = escape_at(token, idx) {
            out.push_str(seq.text);
            idx += seq.len();
        } else {
            idx += token[idx..].chars().next().map_or(1, char::len_utf8);
        }
    }
    out
}

/// Splits a line into alternating space and non-space tokens. Escape
/// sequences attach to the token that follows them.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending = String::new();
    let mut in_space = false;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(seq) = escape_at(text, idx) {
            pending.push_str(seq.text);
            idx += seq.len();
            continue;
        }

        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        if is_space != in_space && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push_str(&pending);
        pending.clear();
        current.push(ch);
        in_space = is_space;
        idx += ch.len_utf8();
    }

    current.push_str(&pending);
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Hard-splits a token wider than `width` on grapheme boundaries.
fn split_long_token(token: &str, width: usize, state: &mut SgrState) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = state.reopen();
    let mut current_width = 0;
    let mut idx = 0;

    while idx < token.len() {
        if let Some(seq) = escape_at(token, idx) {
            current.push_str(seq.text);
            state.apply(seq.text);
            idx += seq.len();
            continue;
        }

        let end = next_escape_or_end(token, idx);
        for grapheme in token[idx..end].graphemes(true) {
            let grapheme_cols = grapheme_width(grapheme);
            if current_width > 0 && current_width + grapheme_cols > width {
                current.push_str(state.break_reset());
                pieces.push(std::mem::replace(&mut current, state.reopen()));
                current_width = 0;
            }
            current.push_str(grapheme);
            current_width += grapheme_cols;
        }
        idx = end;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    if pieces.is_empty() {
        pieces.push(String::new());
    }
    pieces
}

//! Escape sequence scanning and SGR state tracking.

/// Family of a recognised escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

/// One escape sequence found in a string, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeSequence<'a> {
    pub text: &'a str,
    pub kind: SequenceKind,
}

impl EscapeSequence<'_> {
    /// Byte length of the sequence.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True for `CSI ... m` (select graphic rendition).
    pub fn is_sgr(&self) -> bool {
        self.kind == SequenceKind::Csi && self.text.ends_with('m')
    }
}

/// Returns the complete escape sequence starting at byte `pos`, if any.
///
/// Unterminated sequences return `None` so callers treat the bytes as text
/// instead of swallowing the rest of the line.
pub fn escape_at(input: &str, pos: usize) -> Option<EscapeSequence<'_>> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }

    let (kind, end) = match bytes.get(pos + 1)? {
        b'[' => (SequenceKind::Csi, csi_end(bytes, pos + 2)?),
        b']' => (SequenceKind::Osc, string_terminator_end(bytes, pos + 2)?),
        b'_' => (SequenceKind::Apc, string_terminator_end(bytes, pos + 2)?),
        b'P' => (SequenceKind::Dcs, string_terminator_end(bytes, pos + 2)?),
        b'O' if pos + 2 < bytes.len() => (SequenceKind::Ss3, pos + 3),
        _ => return None,
    };

    input.get(pos..end).map(|text| EscapeSequence { text, kind })
}

/// Byte offset of the next escape sequence at or after `pos`, or the end of input.
pub fn next_escape_or_end(input: &str, pos: usize) -> usize {
    let mut idx = pos;
    while idx < input.len() {
        if escape_at(input, idx).is_some() {
            return idx;
        }
        idx += input[idx..].chars().next().map_or(1, char::len_utf8);
    }
    input.len()
}

/// Removes every recognised escape sequence.
pub fn strip_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(seq) = escape_at(input, idx) {
            idx += seq.len();
            continue;
        }
        let ch_len = input[idx..].chars().next().map_or(1, char::len_utf8);
        let end = next_escape_or_end(input, idx + ch_len);
        out.push_str(&input[idx..end]);
        idx = end;
    }
    out
}

fn csi_end(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| (0x40..=0x7e).contains(b))
        .map(|offset| from + offset + 1)
}

fn string_terminator_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut idx = from;
    while idx < bytes.len() {
        match bytes[idx] {
            0x07 => return Some(idx + 1),
            0x1b if bytes.get(idx + 1) == Some(&b'\\') => return Some(idx + 2),
            _ => idx += 1,
        }
    }
    None
}

/// Running SGR attribute state, used to re-open styles on wrapped lines.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SgrState {
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    blink: bool,
    inverse: bool,
    hidden: bool,
    strikethrough: bool,
    fg: Option<String>,
    bg: Option<String>,
}

impl SgrState {
    /// Folds one escape sequence into the state. Non-SGR sequences are ignored.
    pub fn apply(&mut self, sequence: &str) {
        let Some(params) = sequence
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };

        if params.is_empty() {
            *self = Self::default();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let code = parts[idx].parse::<u16>().unwrap_or(0);
            if code == 38 || code == 48 {
                let taken = match parts.get(idx + 1) {
                    Some(&"5") if idx + 2 < parts.len() => 3,
                    Some(&"2") if idx + 4 < parts.len() => 5,
                    _ => 0,
                };
                if taken > 0 {
                    let colour = parts[idx..idx + taken].join(";");
                    if code == 38 {
                        self.fg = Some(colour);
                    } else {
                        self.bg = Some(colour);
                    }
                    idx += taken;
                    continue;
                }
            }

            match code {
                0 => *self = Self::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                5 => self.blink = true,
                7 => self.inverse = true,
                8 => self.hidden = true,
                9 => self.strikethrough = true,
                21 => self.bold = false,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                25 => self.blink = false,
                27 => self.inverse = false,
                28 => self.hidden = false,
                29 => self.strikethrough = false,
                39 => self.fg = None,
                49 => self.bg = None,
                30..=37 | 90..=97 => self.fg = Some(code.to_string()),
                40..=47 | 100..=107 => self.bg = Some(code.to_string()),
                _ => {}
            }
            idx += 1;
        }
    }

    /// Folds every SGR sequence found in `text`.
    pub fn apply_all(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(seq) = escape_at(text, idx) {
                self.apply(seq.text);
                idx += seq.len();
            } else {
                idx += text[idx..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// A single SGR sequence that re-establishes the current state, or an empty string.
    pub fn reopen(&self) -> String {
        let flags = [
            (self.bold, "1"),
            (self.dim, "2"),
            (self.italic, "3"),
            (self.underline, "4"),
            (self.blink, "5"),
            (self.inverse, "7"),
            (self.hidden, "8"),
            (self.strikethrough, "9"),
        ];
        let mut codes: Vec<&str> = flags
            .iter()
            .filter_map(|(on, code)| on.then_some(*code))
            .collect();
        if let Some(fg) = self.fg.as_deref() {
            codes.push(fg);
        }
        if let Some(bg) = self.bg.as_deref() {
            codes.push(bg);
        }

        if codes.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", codes.join(";"))
        }
    }

    /// Sequence emitted before a wrap break so underline does not bleed into padding.
    pub fn break_reset(&self) -> &'static str {
        if self.underline {
            "\x1b[24m"
        } else {
            ""
        }
    }
}

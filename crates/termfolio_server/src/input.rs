//! Raw terminal bytes to structured input events.
//!
//! Reads arrive in arbitrary chunks, so the decoder buffers split UTF-8
//! characters, split escape sequences and unfinished bracketed pastes until
//! the rest arrives. A lone trailing `ESC` stays pending until [`InputDecoder::flush`]
//! is called, since it may be the start of a sequence.
//!
//! Enter may arrive as `\r`, `\n`, `\r\n` or telnet's `\r\0`. Each form is one
//! `enter`, even when the pair is split across reads.

const ESC: char = '\x1b';
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

/// Input event delivered to a session.
///
/// `raw` is the exact text received for the event. `key_id` is a normalized
/// name such as `enter`, `ctrl+c`, `alt+p` or `pageUp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key { raw: String, key_id: String },
    Text { raw: String, text: String },
    Paste { raw: String, text: String },
    Resize { columns: u16, rows: u16 },
    /// SGR mouse report (`CSI < button ; column ; row M|m`).
    Mouse {
        raw: String,
        action: MouseAction,
        column: u16,
        row: u16,
    },
    UnknownRaw { raw: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    WheelUp,
    WheelDown,
    Press,
    Release,
    Drag,
}

impl InputEvent {
    pub fn key(key_id: &str) -> Self {
        Self::Key {
            raw: String::new(),
            key_id: key_id.to_string(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::Text {
            raw: text.to_string(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug)]
enum SequenceStatus {
    Complete,
    Incomplete,
}

#[derive(Debug, Default)]
pub struct InputDecoder {
    bytes: Vec<u8>,
    buffer: String,
    paste: Option<String>,
    /// The last emitted sequence was a bare `\r`.
    after_cr: bool,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while bytes are held back waiting for the rest of a sequence.
    pub fn has_pending(&self) -> bool {
        !self.bytes.is_empty() || !self.buffer.is_empty()
    }

    pub fn feed(&mut self, data: &[u8]) -> Vec<InputEvent> {
        let text = self.decode_utf8(data);
        let text = if self.after_cr && !text.is_empty() {
            self.after_cr = false;
            text.strip_prefix(['\n', '\0']).unwrap_or(&text).to_string()
        } else {
            text
        };
        self.buffer.push_str(&text);
        self.drain(false)
    }

    /// Emits whatever is pending as-is. A lone `ESC` becomes the escape key.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        if !self.bytes.is_empty() {
            let rest = String::from_utf8_lossy(&self.bytes).into_owned();
            self.bytes.clear();
            self.buffer.push_str(&rest);
        }
        self.drain(true)
    }

    fn decode_utf8(&mut self, data: &[u8]) -> String {
        self.bytes.extend_from_slice(data);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(text) => {
                    out.push_str(text);
                    self.bytes.clear();
                    return out;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.bytes[..valid]));
                    match error.error_len() {
                        None => {
                            self.bytes.drain(..valid);
                            return out;
                        }
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.bytes.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
    }

    fn drain(&mut self, force: bool) -> Vec<InputEvent> {
        let mut events = Vec::new();
        loop {
            if let Some(paste) = self.paste.as_mut() {
                paste.push_str(&self.buffer);
                self.buffer.clear();
                let Some(end) = paste.find(PASTE_END) else {
                    if force {
                        let text = std::mem::take(paste);
                        self.paste = None;
                        events.push(paste_event(text));
                    }
                    return events;
                };
                let rest = paste[end + PASTE_END.len()..].to_string();
                paste.truncate(end);
                let text = std::mem::take(paste);
                self.paste = None;
                events.push(paste_event(text));
                self.buffer = rest;
                continue;
            }

            if let Some(start) = self.buffer.find(PASTE_START) {
                let before = self.buffer[..start].to_string();
                let after = self.buffer[start + PASTE_START.len()..].to_string();
                let (sequences, _) = split_sequences(&before, true);
                push_sequences(&mut events, sequences);
                self.paste = Some(String::new());
                self.buffer = after;
                continue;
            }

            let (sequences, remainder) = split_sequences(&self.buffer, force);
            self.after_cr =
                remainder.is_empty() && sequences.last().is_some_and(|last| last == "\r");
            push_sequences(&mut events, sequences);
            self.buffer = remainder;
            return events;
        }
    }
}

fn paste_event(text: String) -> InputEvent {
    InputEvent::Paste {
        raw: format!("{PASTE_START}{text}{PASTE_END}"),
        text,
    }
}

/// Adjacent printable characters are merged into one text event.
fn push_sequences(events: &mut Vec<InputEvent>, sequences: Vec<String>) {
    for sequence in sequences {
        let event = parse_sequence(&sequence);
        if let (
            Some(InputEvent::Text { raw, text }),
            InputEvent::Text {
                raw: next_raw,
                text: next_text,
            },
        ) = (events.last_mut(), &event)
        {
            raw.push_str(next_raw);
            text.push_str(next_text);
            continue;
        }
        events.push(event);
    }
}

/// Splits `buffer` into complete sequences. Without `force`, an unfinished
/// escape sequence at the end is returned as the remainder.
fn split_sequences(buffer: &str, force: bool) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let mut pos = 0;

    while pos < buffer.len() {
        let rest = &buffer[pos..];
        let Some(first) = rest.chars().next() else {
            break;
        };
        if first == '\r' && rest[1..].starts_with(['\n', '\0']) {
            sequences.push(rest[..2].to_string());
            pos += 2;
            continue;
        }
        if first != ESC {
            sequences.push(first.to_string());
            pos += first.len_utf8();
            continue;
        }

        let mut end = pos + 1;
        let mut complete = false;
        while end <= buffer.len() {
            if !buffer.is_char_boundary(end) {
                end += 1;
                continue;
            }
            if let SequenceStatus::Complete = sequence_status(&buffer[pos..end]) {
                complete = true;
                break;
            }
            end += 1;
        }

        if complete {
            sequences.push(buffer[pos..end].to_string());
            pos = end;
        } else if force {
            sequences.push(buffer[pos..].to_string());
            pos = buffer.len();
        } else {
            return (sequences, buffer[pos..].to_string());
        }
    }

    (sequences, String::new())
}

fn sequence_status(data: &str) -> SequenceStatus {
    let after = &data[1..];
    let Some(introducer) = after.chars().next() else {
        return SequenceStatus::Incomplete;
    };

    match introducer {
        '[' => {
            let payload = &after[1..];
            match payload.as_bytes().last() {
                Some(last) if (0x40..=0x7e).contains(last) => SequenceStatus::Complete,
                _ => SequenceStatus::Incomplete,
            }
        }
        ']' | 'P' | '_' => {
            if data.len() > 2 && (data.ends_with("\x1b\\") || data.ends_with('\x07')) {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        'O' => {
            if after.chars().count() >= 2 {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        _ => SequenceStatus::Complete,
    }
}

fn parse_sequence(sequence: &str) -> InputEvent {
    if let Some((columns, rows)) = parse_window_report(sequence) {
        return InputEvent::Resize { columns, rows };
    }
    if let Some((action, column, row)) = parse_sgr_mouse(sequence) {
        return InputEvent::Mouse {
            raw: sequence.to_string(),
            action,
            column,
            row,
        };
    }
    if let Some(key_id) = parse_key(sequence) {
        return InputEvent::Key {
            raw: sequence.to_string(),
            key_id,
        };
    }
    if !sequence.chars().any(char::is_control) {
        return InputEvent::Text {
            raw: sequence.to_string(),
            text: sequence.to_string(),
        };
    }
    InputEvent::UnknownRaw {
        raw: sequence.to_string(),
    }
}

/// xterm `CSI 8 ; rows ; cols t` window size report.
fn parse_window_report(sequence: &str) -> Option<(u16, u16)> {
    let body = sequence.strip_prefix("\x1b[8;")?.strip_suffix('t')?;
    let (rows, columns) = body.split_once(';')?;
    let rows = rows.parse().ok()?;
    let columns = columns.parse().ok()?;
    Some((columns, rows))
}

fn parse_sgr_mouse(sequence: &str) -> Option<(MouseAction, u16, u16)> {
    let body = sequence.strip_prefix("\x1b[<")?;
    let (body, released) = match body.strip_suffix('M') {
        Some(body) => (body, false),
        None => (body.strip_suffix('m')?, true),
    };
    let mut fields = body.split(';');
    let button: u16 = fields.next()?.parse().ok()?;
    let column = fields.next()?.parse().ok()?;
    let row = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }

    // Bits 2-4 carry shift/alt/ctrl.
    let button = button & !0b1_1100;
    let action = match button {
        64 => MouseAction::WheelUp,
        65 => MouseAction::WheelDown,
        _ if released => MouseAction::Release,
        _ if button & 32 != 0 => MouseAction::Drag,
        _ => MouseAction::Press,
    };
    Some((action, column, row))
}

fn parse_key(sequence: &str) -> Option<String> {
    let named = match sequence {
        "\r" | "\n" | "\r\n" | "\r\0" => "enter",
        "\t" => "tab",
        "\x7f" | "\x08" => "backspace",
        "\x1b" => "escape",
        "\x1b[A" | "\x1bOA" => "up",
        "\x1b[B" | "\x1bOB" => "down",
        "\x1b[C" | "\x1bOC" => "right",
        "\x1b[D" | "\x1bOD" => "left",
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => "home",
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => "end",
        "\x1b[3~" => "delete",
        "\x1b[5~" => "pageUp",
        "\x1b[6~" => "pageDown",
        "\x1b[Z" => "shift+tab",
        "\x00" => "ctrl+space",
        "\x1f" => "ctrl+/",
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }

    let mut chars = sequence.chars();
    let first = chars.next()?;
    let second = chars.next();

    if second.is_none() {
        return ctrl_letter(first);
    }

    if first == ESC {
        let rest = &sequence[1..];
        if let Some(inner) = parse_key(rest) {
            return Some(format!("alt+{inner}"));
        }
        let mut rest_chars = rest.chars();
        let ch = rest_chars.next()?;
        if rest_chars.next().is_none() && !ch.is_control() {
            return Some(format!("alt+{}", ch.to_lowercase()));
        }
    }

    None
}

fn ctrl_letter(ch: char) -> Option<String> {
    let code = ch as u32;
    if (1..=26).contains(&code) {
        let letter = char::from_u32('a' as u32 + code - 1)?;
        return Some(format!("ctrl+{letter}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{InputDecoder, InputEvent, MouseAction};

    fn key_ids(events: &[InputEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| match event {
                InputEvent::Key { key_id, .. } => key_id.clone(),
                InputEvent::Text { text, .. } => format!("text:{text}"),
                InputEvent::Paste { text, .. } => format!("paste:{text}"),
                InputEvent::Resize { columns, rows } => format!("resize:{columns}x{rows}"),
                InputEvent::Mouse { action, .. } => format!("mouse:{action:?}"),
                InputEvent::UnknownRaw { raw } => format!("raw:{raw:?}"),
            })
            .collect()
    }

    #[test]
    fn printable_runs_become_one_text_event() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"hello world"),
            vec![InputEvent::text("hello world")]
        );
    }

    #[test]
    fn control_bytes_and_named_keys() {
        let mut decoder = InputDecoder::new();
        let events = decoder.feed(b"a\r\x03\x7f\x08\x15\x1f\x1b[A\x1b[6~\x1bOB");
        assert_eq!(
            key_ids(&events),
            vec![
                "text:a", "enter", "ctrl+c", "backspace", "backspace", "ctrl+u", "ctrl+/", "up",
                "pageDown", "down"
            ]
        );
    }

    #[test]
    fn escape_prefix_is_alt() {
        let mut decoder = InputDecoder::new();
        assert_eq!(key_ids(&decoder.feed(b"\x1bp\x1bH")), vec!["alt+p", "alt+h"]);
    }

    #[test]
    fn lone_escape_waits_for_flush() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b").is_empty());
        assert!(decoder.has_pending());
        assert_eq!(key_ids(&decoder.flush()), vec!["escape"]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn split_escape_sequence_is_reassembled() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b[").is_empty());
        assert_eq!(key_ids(&decoder.feed(b"5~")), vec!["pageUp"]);
    }

    #[test]
    fn split_utf8_is_reassembled() {
        let mut decoder = InputDecoder::new();
        let bytes = "é".as_bytes();
        assert!(decoder.feed(&bytes[..1]).is_empty());
        assert_eq!(decoder.feed(&bytes[1..]), vec![InputEvent::text("é")]);
    }

    #[test]
    fn bracketed_paste_across_reads() {
        let mut decoder = InputDecoder::new();
        assert_eq!(key_ids(&decoder.feed(b"x\x1b[200~line one\n")), vec!["text:x"]);
        assert_eq!(
            key_ids(&decoder.feed(b"line two\x1b[201~y")),
            vec!["paste:line one\nline two", "text:y"]
        );
    }

    #[test]
    fn window_size_report_becomes_resize() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            decoder.feed(b"\x1b[8;40;120t"),
            vec![InputEvent::Resize {
                columns: 120,
                rows: 40
            }]
        );
    }

    #[test]
    fn crlf_and_telnet_enter_are_one_key() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            key_ids(&decoder.feed(b"/open demo\r\n")),
            vec!["text:/open demo", "enter"]
        );
        assert_eq!(
            key_ids(&decoder.feed(b"x\r\0y\n")),
            vec!["text:x", "enter", "text:y", "enter"]
        );
    }

    #[test]
    fn crlf_split_across_reads_is_one_key() {
        let mut decoder = InputDecoder::new();
        assert_eq!(key_ids(&decoder.feed(b"hi\r")), vec!["text:hi", "enter"]);
        assert!(decoder.feed(b"\n").is_empty());
        assert_eq!(key_ids(&decoder.feed(b"\n")), vec!["enter"]);
        assert_eq!(key_ids(&decoder.feed(b"\r")), vec!["enter"]);
        assert_eq!(key_ids(&decoder.feed(b"a")), vec!["text:a"]);
    }

    #[test]
    fn sgr_mouse_reports() {
        let mut decoder = InputDecoder::new();
        assert_eq!(
            key_ids(&decoder.feed(
                b"\x1b[<64;10;5M\x1b[<65;10;5M\x1b[<0;3;4M\x1b[<0;3;4m\x1b[<32;4;4M"
            )),
            vec![
                "mouse:WheelUp",
                "mouse:WheelDown",
                "mouse:Press",
                "mouse:Release",
                "mouse:Drag"
            ]
        );
        assert_eq!(
            decoder.feed(b"\x1b[<80;7;9M"),
            vec![InputEvent::Mouse {
                raw: "\x1b[<80;7;9M".to_string(),
                action: MouseAction::WheelUp,
                column: 7,
                row: 9,
            }]
        );
    }

    #[test]
    fn split_mouse_report_is_reassembled() {
        let mut decoder = InputDecoder::new();
        assert!(decoder.feed(b"\x1b[<65;1").is_empty());
        assert_eq!(key_ids(&decoder.feed(b"2;3M")), vec!["mouse:WheelDown"]);
    }
}

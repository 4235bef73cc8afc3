use chat_provider::{ChatMessage, ChatRequest};
use serde::Serialize;

/// JSON body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayChatRequest {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
}

impl From<ChatRequest> for GatewayChatRequest {
    fn from(request: ChatRequest) -> Self {
        Self {
            message: request.message,
            session_id: request.session_id,
            history: request.history,
        }
    }
}

/// Incremental UTF-8 decoder for a byte stream whose chunks may split
/// multi-byte characters.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Appends `bytes` and returns every complete character decoded so far.
    /// Invalid sequences decode to U+FFFD; an incomplete tail is held back.
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match error.error_len() {
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
    }

    /// Flushes a dangling partial character at end of stream.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

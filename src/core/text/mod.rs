//! Text helpers (ANSI parsing, width calculations, wrapping, truncation).
//!
//! These helpers are pure (string in/string out): nothing here keeps state
//! between calls.

pub mod ansi;
pub mod utils;
pub mod width;
pub mod wrap;

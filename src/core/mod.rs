//! Core text primitives.

pub mod text;

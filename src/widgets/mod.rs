//! Higher-level building blocks composed from the text primitives.

pub mod markdown;
pub mod panel;

pub use markdown::{MarkdownRenderer, MarkdownStyleFn, MarkdownTheme};
pub use panel::Panel;

//! ANSI-aware text layout for terminal portfolio sessions.
//!
//! Invariant: every helper is a pure function of its input and the explicit
//! width it is handed; nothing caches rendered output between calls.
//!
//! # Public API Overview
//! - Measure, wrap, truncate and center styled text ([`visible_width`],
//!   [`wrap_text_with_ansi`], [`truncate_to_width`], [`center`]).
//! - Derive responsive sizes from the terminal width with [`Layout`].
//! - Draw titled boxes with [`Panel`] and render markdown, including partial
//!   markdown that is still streaming in, with [`MarkdownRenderer`].
//! - Style text with the 24-bit [`Theme`] palette.

pub mod core;
pub mod layout;
pub mod theme;
pub mod widgets;

/// Responsive sizing.
pub use crate::layout::{Breakpoint, Layout};
/// Palette and styles.
pub use crate::theme::{palette, Rgb, Style, Theme};
/// Built-in widgets.
pub use crate::widgets::{MarkdownRenderer, MarkdownStyleFn, MarkdownTheme, Panel};

/// ANSI-aware wrapping helper.
pub use crate::core::text::wrap::wrap_text_with_ansi;
/// ANSI-aware truncation and padding helpers.
pub use crate::core::text::utils::{
    center, center_padded, pad_to_width, truncate_padded, truncate_to_width, ELLIPSIS,
};
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
/// Escape sequence stripping.
pub use crate::core::text::ansi::strip_escapes;

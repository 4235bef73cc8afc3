//! Colour palette and text styles.
//!
//! Styles emit 24-bit SGR sequences and close each attribute with its own
//! reset code (`39`, `22`, `23`, `24`) rather than `0`, so a styled span can
//! sit inside another without clearing the outer attributes.

use crate::widgets::markdown::MarkdownTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub mod palette {
    use super::Rgb;

    pub const NEON: Rgb = Rgb(0xff, 0x2a, 0x6d);
    pub const CYAN: Rgb = Rgb(0x05, 0xd9, 0xe8);
    pub const YELLOW: Rgb = Rgb(0xf9, 0xf8, 0x71);
    pub const GREEN: Rgb = Rgb(0x39, 0xff, 0x14);
    pub const ORANGE: Rgb = Rgb(0xff, 0x6e, 0x27);
    pub const RED: Rgb = Rgb(0xff, 0x07, 0x3a);
    pub const PURPLE: Rgb = Rgb(0xbd, 0x00, 0xff);
    pub const BLUE: Rgb = Rgb(0x01, 0xc8, 0xee);
    pub const MUTED: Rgb = Rgb(0x5a, 0x62, 0x70);
    pub const DIM: Rgb = Rgb(0x2d, 0x31, 0x38);
    pub const BODY: Rgb = Rgb(0xc7, 0xd5, 0xe0);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    fg: Option<Rgb>,
    bold: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
    disabled: bool,
}

impl Style {
    /// Never emits escapes, whatever modifiers are added to it.
    pub const NONE: Style = Style {
        fg: None,
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
        disabled: true,
    };

    pub const fn fg(colour: Rgb) -> Self {
        Self {
            fg: Some(colour),
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            disabled: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub const fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn paint(&self, text: &str) -> String {
        if text.is_empty() || self.disabled {
            return text.to_string();
        }

        let mut open = String::new();
        let mut close = String::new();
        if self.bold {
            open.push_str("\x1b[1m");
            close.insert_str(0, "\x1b[22m");
        }
        if self.italic {
            open.push_str("\x1b[3m");
            close.insert_str(0, "\x1b[23m");
        }
        if self.underline {
            open.push_str("\x1b[4m");
            close.insert_str(0, "\x1b[24m");
        }
        if self.strikethrough {
            open.push_str("\x1b[9m");
            close.insert_str(0, "\x1b[29m");
        }
        if let Some(Rgb(r, g, b)) = self.fg {
            open.push_str(&format!("\x1b[38;2;{r};{g};{b}m"));
            close.insert_str(0, "\x1b[39m");
        }

        format!("{open}{text}{close}")
    }
}

/// Named styles shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub neon: Style,
    pub cyan: Style,
    pub yellow: Style,
    pub green: Style,
    pub orange: Style,
    pub red: Style,
    pub purple: Style,
    pub blue: Style,
    pub muted: Style,
    pub dim: Style,
    pub body: Style,
    pub link: Style,
}

impl Theme {
    pub const fn cyberpunk() -> Self {
        Self {
            neon: Style::fg(palette::NEON),
            cyan: Style::fg(palette::CYAN),
            yellow: Style::fg(palette::YELLOW),
            green: Style::fg(palette::GREEN),
            orange: Style::fg(palette::ORANGE),
            red: Style::fg(palette::RED),
            purple: Style::fg(palette::PURPLE),
            blue: Style::fg(palette::BLUE),
            muted: Style::fg(palette::MUTED),
            dim: Style::fg(palette::DIM),
            body: Style::fg(palette::BODY),
            link: Style::fg(palette::BLUE).underline(),
        }
    }

    /// Every style is [`Style::NONE`]; rendered output is bare text.
    pub const fn plain() -> Self {
        Self {
            neon: Style::NONE,
            cyan: Style::NONE,
            yellow: Style::NONE,
            green: Style::NONE,
            orange: Style::NONE,
            red: Style::NONE,
            purple: Style::NONE,
            blue: Style::NONE,
            muted: Style::NONE,
            dim: Style::NONE,
            body: Style::NONE,
            link: Style::NONE,
        }
    }

    pub fn markdown_theme(&self) -> MarkdownTheme {
        let theme = *self;
        MarkdownTheme {
            headings: [
                Box::new(move |text| theme.neon.bold().paint(text)),
                Box::new(move |text| theme.neon.bold().paint(text)),
                Box::new(move |text| theme.cyan.bold().paint(text)),
                Box::new(move |text| theme.yellow.paint(text)),
            ],
            link: Box::new(move |text| theme.blue.underline().paint(text)),
            link_url: Box::new(move |text| theme.dim.paint(text)),
            code: Box::new(move |text| theme.green.paint(text)),
            code_delimiter: Box::new(move |text| theme.cyan.paint(text)),
            code_block: Box::new(move |text| theme.green.paint(text)),
            code_block_border: Box::new(move |text| theme.dim.paint(text)),
            code_block_lang: Box::new(move |text| theme.cyan.paint(text)),
            quote: Box::new(move |text| theme.muted.italic().paint(text)),
            quote_border: Box::new(move |text| theme.dim.paint(text)),
            hr: Box::new(move |text| theme.dim.paint(text)),
            bullet: Box::new(move |text| theme.green.paint(text)),
            nested_bullet: Box::new(move |text| theme.cyan.paint(text)),
            ordered_bullet: Box::new(move |text| theme.yellow.paint(text)),
            bold: Box::new(move |text| theme.neon.bold().paint(text)),
            italic: Box::new(move |text| theme.muted.italic().paint(text)),
            strikethrough: Box::new(move |text| theme.muted.strikethrough().paint(text)),
            table_border: Box::new(move |text| theme.cyan.paint(text)),
            table_header: Box::new(move |text| theme.neon.bold().paint(text)),
            table_cell: [
                Box::new(move |text| theme.body.paint(text)),
                Box::new(move |text| theme.muted.paint(text)),
            ],
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::cyberpunk()
    }
}

#[cfg(test)]
mod tests {
    use super::{palette, Style, Theme};
    use crate::core::text::width::visible_width;

    #[test]
    fn paint_wraps_with_attribute_specific_resets() {
        let styled = Style::fg(palette::NEON).bold().paint("x");
        assert_eq!(styled, "\x1b[1m\x1b[38;2;255;42;109mx\x1b[39m\x1b[22m");
        assert_eq!(visible_width(&styled), 1);
    }

    #[test]
    fn plain_theme_is_identity() {
        let theme = Theme::plain();
        assert_eq!(theme.neon.bold().paint("abc"), "abc");
        assert_eq!(theme.link.paint("url"), "url");
    }

    #[test]
    fn empty_text_stays_empty() {
        assert_eq!(Style::fg(palette::CYAN).paint(""), "");
    }
}

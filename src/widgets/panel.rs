//! Titled box drawn around a block of lines.

use crate::core::text::utils::{center, pad_to_width, truncate_to_width};
use crate::core::text::width::visible_width;
use crate::layout::Layout;
use crate::theme::Theme;

/// `┌── TITLE ──┐` / `│ line │` / `└────┘`, every row `box_width` columns wide
/// and centered in the view. Lines wider than the content width are
/// truncated so the borders always line up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    title: String,
    lines: Vec<String>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn render(&self, layout: &Layout, theme: &Theme) -> Vec<String> {
        let cw = layout.content_width;
        let view = layout.view_width;

        let title = if visible_width(&self.title) > cw.saturating_sub(4) {
            truncate_to_width(&self.title, cw.saturating_sub(4))
        } else {
            self.title.clone()
        };
        let title_width = visible_width(&title);
        let title_pad = (cw.saturating_sub(title_width) / 2).max(1);
        let tail = cw.saturating_sub(title_pad + title_width).max(1);

        let top = format!(
            "{}{}{}{}{}",
            theme.yellow.paint("┌"),
            theme.muted.paint(&"─".repeat(title_pad)),
            theme.cyan.bold().paint(&format!(" {title} ")),
            theme.muted.paint(&"─".repeat(tail)),
            theme.yellow.paint("┐"),
        );

        let mut rows = Vec::with_capacity(self.lines.len() + 2);
        rows.push(center(&top, view));

        let left = theme.muted.paint("│ ");
        let right = theme.muted.paint(" │");
        for line in &self.lines {
            let fitted = if visible_width(line) > cw {
                truncate_to_width(line, cw)
            } else {
                line.clone()
            };
            let row = format!("{left}{}{right}", pad_to_width(&fitted, cw));
            rows.push(center(&row, view));
        }

        let bottom = format!(
            "{}{}{}",
            theme.yellow.paint("└"),
            theme.muted.paint(&"─".repeat(cw + 2)),
            theme.yellow.paint("┘"),
        );
        rows.push(center(&bottom, view));
        rows
    }
}

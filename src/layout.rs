//! Responsive sizing derived from the terminal width.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// Fewer than 60 columns.
    Narrow,
    /// 60 to 99 columns.
    Medium,
    /// 100 columns or more.
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub screen_width: usize,
    pub breakpoint: Breakpoint,
    /// Columns available between the frame borders (`║ … ║`).
    pub view_width: usize,
    /// Outer width of a panel, borders included.
    pub box_width: usize,
    /// Columns available for text inside a panel.
    pub content_width: usize,
}

impl Layout {
    pub const MIN_BOX_WIDTH: usize = 12;
    const FRAME_COST: usize = 4;
    const BOX_COST: usize = 4;

    pub fn for_width(screen_width: usize) -> Self {
        let breakpoint = match screen_width {
            0..=59 => Breakpoint::Narrow,
            60..=99 => Breakpoint::Medium,
            _ => Breakpoint::Wide,
        };
        let box_width = match breakpoint {
            Breakpoint::Narrow => screen_width.saturating_sub(4),
            Breakpoint::Medium => screen_width.saturating_sub(8).min(60),
            Breakpoint::Wide => screen_width.saturating_sub(20).min(70),
        }
        .max(Self::MIN_BOX_WIDTH);

        Self {
            screen_width,
            breakpoint,
            view_width: screen_width.saturating_sub(Self::FRAME_COST),
            box_width,
            content_width: box_width - Self::BOX_COST,
        }
    }

    pub fn max_tech_tags(&self) -> usize {
        if self.content_width < 40 {
            2
        } else {
            3
        }
    }

    pub fn large_banner(&self) -> bool {
        self.screen_width >= 60
    }

    /// Help collapses into a single panel below this content width.
    pub fn compact_help(&self) -> bool {
        self.content_width < 40
    }

    /// Welcome shortcuts switch to one entry per row below this content width.
    pub fn compact_shortcuts(&self) -> bool {
        self.content_width < 45
    }
}

#[cfg(test)]
mod tests {
    use super::{Breakpoint, Layout};

    #[test]
    fn breakpoints_follow_screen_width() {
        assert_eq!(Layout::for_width(59).breakpoint, Breakpoint::Narrow);
        assert_eq!(Layout::for_width(60).breakpoint, Breakpoint::Medium);
        assert_eq!(Layout::for_width(99).breakpoint, Breakpoint::Medium);
        assert_eq!(Layout::for_width(100).breakpoint, Breakpoint::Wide);
    }

    #[test]
    fn box_width_per_breakpoint() {
        assert_eq!(Layout::for_width(40).box_width, 36);
        assert_eq!(Layout::for_width(64).box_width, 56);
        assert_eq!(Layout::for_width(80).box_width, 60);
        assert_eq!(Layout::for_width(120).box_width, 70);
        assert_eq!(Layout::for_width(80).content_width, 56);
    }

    #[test]
    fn box_never_shrinks_below_minimum() {
        let layout = Layout::for_width(10);
        assert_eq!(layout.box_width, Layout::MIN_BOX_WIDTH);
        assert_eq!(layout.content_width, 8);
        assert_eq!(Layout::for_width(0).box_width, Layout::MIN_BOX_WIDTH);
    }

    #[test]
    fn density_knobs() {
        assert_eq!(Layout::for_width(40).max_tech_tags(), 2);
        assert_eq!(Layout::for_width(80).max_tech_tags(), 3);
        assert!(!Layout::for_width(59).large_banner());
        assert!(Layout::for_width(60).large_banner());
        assert!(Layout::for_width(40).compact_help());
        assert!(!Layout::for_width(80).compact_shortcuts());
    }
}

use crate::text_mod::{display_width, truncate};

pub const DEFAULT_PANEL_WIDTH: usize = 100;
pub const MIN_PANEL_WIDTH: usize = 40;
pub const MAX_PANEL_WIDTH: usize = 240;

/// A fixed-width box. Every line it produces measures exactly `width`
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    width: usize,
}

impl Default for Panel {
    fn default() -> Self {
        Self::new(DEFAULT_PANEL_WIDTH)
    }
}

impl Panel {
    /// Widths outside `MIN_PANEL_WIDTH..=MAX_PANEL_WIDTH` are clamped.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.clamp(MIN_PANEL_WIDTH, MAX_PANEL_WIDTH),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Columns available for text between `│ ` and ` │`.
    pub fn inner_width(&self) -> usize {
        self.width.saturating_sub(4)
    }

    pub fn top(&self) -> String {
        format!("┌{}┐", "─".repeat(self.width - 2))
    }

    pub fn bottom(&self) -> String {
        format!("└{}┘", "─".repeat(self.width - 2))
    }

    pub fn separator(&self) -> String {
        format!("├{}┤", "─".repeat(self.width - 2))
    }

    pub fn line(&self, text: &str) -> String {
        let inner = self.inner_width();
        let flat: String = text
            .chars()
            .map(|ch| if ch.is_control() { ' ' } else { ch })
            .collect();
        let fitted = truncate(&flat, inner);
        let pad = inner.saturating_sub(display_width(&fitted));
        format!("│ {}{} │", fitted, " ".repeat(pad))
    }

    pub fn empty_line(&self) -> String {
        self.line("")
    }

    /// One boxed line per line of `text`.
    pub fn lines<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split('\n').map(|line| self.line(line))
    }
}

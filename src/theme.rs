use ratatui::style::{Color, Style};

/// Theme configuration for the editing surface
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the editor
    pub background: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the status bar
    pub filename_color: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,

    /// Border color of the tree panel
    pub panel_border: Color,

    /// Color of block types in the tree panel
    pub tree_kind_fg: Color,

    /// Color of character properties in the tree panel
    pub tree_prop_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            panel_border: Color::DarkGray,
            tree_kind_fg: Color::LightGreen,
            tree_prop_fg: Color::LightMagenta,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn filename_style(&self) -> Style {
        Style::default().fg(self.filename_color)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn editor_style(&self) -> Style {
        Style::default().bg(self.background)
    }

    pub fn panel_style(&self) -> Style {
        Style::default().fg(self.panel_border)
    }

    pub fn tree_kind_style(&self) -> Style {
        Style::default().fg(self.tree_kind_fg)
    }

    pub fn tree_prop_style(&self) -> Style {
        Style::default().fg(self.tree_prop_fg)
    }
}

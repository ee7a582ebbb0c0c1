//! TUI theme and styles

use ratatui::style::{Color, Style};

use crate::api::{Priority, Status};

/// Application color theme
pub struct Theme;

impl Theme {
    /// Primary accent color
    pub const PRIMARY: Color = Color::Cyan;

    /// Success color
    pub const SUCCESS: Color = Color::Green;

    /// Error color
    pub const ERROR: Color = Color::Red;

    /// Muted text color
    pub const MUTED: Color = Color::DarkGray;

    /// Header style
    pub fn header() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Selected item style
    pub fn selected() -> Style {
        Style::default().bg(Self::PRIMARY).fg(Color::Black)
    }

    /// Normal text style
    pub fn normal() -> Style {
        Style::default()
    }

    /// Muted text style
    pub fn muted() -> Style {
        Style::default().fg(Self::MUTED)
    }

    /// Badge color for a priority
    pub fn priority_color(priority: Priority) -> Color {
        match priority {
            Priority::Low => Color::Gray,
            Priority::Medium => Color::Blue,
            Priority::High => Color::Yellow,
            Priority::Critical => Color::Red,
        }
    }

    /// Badge color for a status
    pub fn status_color(status: Status) -> Color {
        match status {
            Status::Open => Color::Blue,
            Status::InProgress => Color::Yellow,
            Status::Resolved => Color::Green,
            Status::Closed => Color::Gray,
        }
    }
}

//! Terminal colors

use termimad::crossterm::style::Color;

/// Colors used by the renderer
pub struct Theme {
    /// Idea title and section headers
    pub title: Color,
    pub body: Color,
    /// Secondary info such as the answering model
    pub dim: Color,
    pub error: Color,
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: Color::Magenta,
            body: Color::White,
            dim: Color::DarkGrey,
            error: Color::Red,
            warning: Color::DarkYellow,
        }
    }
}

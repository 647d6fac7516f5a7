//! Terminal output for the one-shot CLI commands

mod renderer;
mod spinner;
mod theme;

pub use renderer::{format_listing, TerminalRenderer};
pub use spinner::ThinkingSpinner;
pub use theme::Theme;

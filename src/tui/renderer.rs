//! Terminal rendering with markdown support

use termimad::crossterm::style::{Color, Stylize};
use termimad::MadSkin;

use super::theme::Theme;
use crate::api::{ModelListing, ModelRef, GENERATE_CONTENT};
use crate::discovery::{score_model, NamespaceSurvey};
use crate::hack::HackIdea;
use serde_json::Value;

/// Renders ideas, diagnostics and model surveys
pub struct TerminalRenderer {
    theme: Theme,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        let theme = Theme::default();
        let skin = Self::build_skin(&theme);
        Self { theme, skin }
    }

    fn build_skin(theme: &Theme) -> MadSkin {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(theme.title);
        skin.bold.set_fg(theme.body);
        skin.italic.set_fg(theme.warning);
        skin.inline_code.set_fg(Color::Green);
        skin
    }

    /// Render a hack idea as markdown followed by the model that wrote it
    pub fn render_idea(&self, idea: &HackIdea, model: &ModelRef) {
        println!();
        self.skin.print_text(&idea.to_markdown());
        println!(
            "  {} {}",
            "\u{2022}".with(self.theme.dim),
            model.to_string().with(self.theme.dim)
        );
        println!();
    }

    /// Render a soft failure together with whatever the model said
    pub fn render_diagnostic(&self, reason: &str, raw: &Value, model: &ModelRef) {
        println!("  {} {}", "\u{26a0}".with(self.theme.warning), reason.with(self.theme.warning));
        println!("  {} {}", "from".with(self.theme.dim), model.to_string().with(self.theme.dim));
        println!();
        match raw {
            Value::String(text) => println!("{}", text),
            Value::Null => println!("{}", "(empty response)".with(self.theme.dim)),
            other => println!(
                "{}",
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
            ),
        }
    }

    /// Render the result of listing every namespace
    pub fn render_survey(&self, survey: &[NamespaceSurvey]) {
        for entry in survey {
            println!("{}", entry.namespace.as_str().with(self.theme.title));
            match &entry.models {
                Ok(models) if models.is_empty() => {
                    println!("  {}", "(no models)".with(self.theme.dim));
                }
                Ok(models) => {
                    for listing in models {
                        let line = format_listing(listing);
                        if listing.supports(GENERATE_CONTENT) {
                            println!("  {}", line.with(self.theme.body));
                        } else {
                            println!("  {}", line.with(self.theme.dim));
                        }
                    }
                }
                Err(e) => self.render_error(&e.to_string()),
            }
            println!();
        }
    }

    /// Render an error message
    pub fn render_error(&self, msg: &str) {
        eprintln!("  {} {}", "\u{2717}".with(self.theme.error), msg.with(self.theme.error));
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// One survey line: score, name and supported methods
pub fn format_listing(listing: &ModelListing) -> String {
    format!(
        "[{:>2}] {} ({})",
        score_model(&listing.name),
        listing.name,
        listing.supported_generation_methods.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_listing() {
        let listing = ModelListing {
            name: "models/gemini-1.5-flash-latest".to_string(),
            display_name: None,
            supported_generation_methods: vec![
                "generateContent".to_string(),
                "countTokens".to_string(),
            ],
        };
        assert_eq!(
            format_listing(&listing),
            "[10] models/gemini-1.5-flash-latest (generateContent, countTokens)"
        );
    }
}

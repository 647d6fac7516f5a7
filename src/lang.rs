//! Language hint detection for Marathi vs English prompts

use serde::{Deserialize, Serialize};

/// Share of non-whitespace characters that must be Devanagari to count as Marathi
const DEVANAGARI_THRESHOLD: f64 = 0.10;

/// Locales the prompt directive knows how to mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lang {
    #[serde(rename = "mr")]
    Marathi,
    #[serde(rename = "en")]
    English,
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::Marathi => "mr",
            Lang::English => "en",
        }
    }
}

fn is_devanagari(ch: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&ch)
}

/// Classify text as Marathi when more than 10% of its visible characters
/// are Devanagari. Empty input is English.
pub fn detect(text: &str) -> Lang {
    let mut total = 0usize;
    let mut devanagari = 0usize;

    for ch in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_devanagari(ch) {
            devanagari += 1;
        }
    }

    if total == 0 {
        return Lang::English;
    }

    if devanagari as f64 > total as f64 * DEVANAGARI_THRESHOLD {
        Lang::Marathi
    } else {
        Lang::English
    }
}

/// Resolve the hint sent by the client into the one embedded in the prompt.
///
/// Missing, blank and `auto` hints fall back to [`detect`] on the prompt;
/// anything else is passed through as given.
pub fn resolve_hint(hint: Option<&str>, prompt: &str) -> String {
    match hint.map(str::trim) {
        None | Some("") => detect(prompt).code().to_string(),
        Some(h) if h.eq_ignore_ascii_case("auto") => detect(prompt).code().to_string(),
        Some(h) => h.to_lowercase(),
    }
}

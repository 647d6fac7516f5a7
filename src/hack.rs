//! The normalized hack record returned to callers

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Keys a model answer must carry to skip re-parsing
pub const HACK_KEYS: [&str; 6] = [
    "title",
    "description",
    "category",
    "difficulty",
    "usefulness",
    "bonus",
];

/// Score used when the model gives nothing numeric
const DEFAULT_USEFULNESS: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Advanced,
}

impl Difficulty {
    /// Coerce a free-form difficulty label by substring match.
    pub fn coerce(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("adv") {
            Difficulty::Advanced
        } else if lower.contains("med") {
            Difficulty::Medium
        } else {
            Difficulty::Easy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single hack idea in its normalized, render-ready shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HackIdea {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    /// Always within 0..=100
    pub usefulness: u8,
    #[serde(default)]
    pub bonus: String,
}

impl HackIdea {
    /// Validate and normalize a parsed model answer.
    ///
    /// Accepts an object, or an array whose first object element is used.
    /// Returns `None` when no object is found or the title is blank.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = match value {
            Value::Object(map) => map,
            Value::Array(items) => items.iter().find_map(Value::as_object)?,
            _ => return None,
        };

        let title = text_field(object, "title");
        if title.is_empty() {
            return None;
        }

        Some(Self {
            title,
            description: text_field(object, "description"),
            category: text_field(object, "category"),
            difficulty: Difficulty::coerce(&text_field(object, "difficulty")),
            usefulness: object
                .get("usefulness")
                .map(normalize_usefulness)
                .unwrap_or(DEFAULT_USEFULNESS),
            bonus: text_field(object, "bonus"),
        })
    }

    /// Re-run normalization over an already built idea.
    pub fn normalized(&self) -> Option<Self> {
        serde_json::to_value(self)
            .ok()
            .and_then(|value| Self::from_value(&value))
    }

    /// Render the idea as a short markdown card
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# {}\n\n{}\n\n**Category:** {}  \n**Difficulty:** {}  \n**Usefulness:** {}/100\n",
            self.title, self.description, self.category, self.difficulty, self.usefulness
        );
        if !self.bonus.is_empty() {
            out.push_str(&format!("\n*Bonus:* {}\n", self.bonus));
        }
        out
    }
}

/// True when a JSON object already carries every hack key
pub fn has_hack_keys(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| HACK_KEYS.iter().all(|key| map.contains_key(*key)))
        .unwrap_or(false)
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// First integer embedded in free text, sign included
const DIGIT_RUN_PATTERN: &str = r"-?\d+";

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIGIT_RUN_PATTERN).expect("DIGIT_RUN_PATTERN is checked in tests"))
}

/// Clamp a usefulness value into 0..=100.
///
/// Strings contribute their first digit run; anything else falls back to 50.
pub fn normalize_usefulness(value: &Value) -> u8 {
    let raw: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => digit_run().find(s).map(|m| {
            let run = m.as_str();
            run.parse::<i64>().map(|v| v as f64).unwrap_or(if run.starts_with('-') {
                f64::MIN
            } else {
                f64::MAX
            })
        }),
        _ => None,
    };

    match raw {
        Some(v) if !v.is_nan() => v.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_USEFULNESS,
    }
}

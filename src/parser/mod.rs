//! Tolerant extraction of JSON from model output
//!
//! Models are asked for strict JSON but routinely wrap it in markdown fences
//! or surround it with prose. Extraction tries, in order:
//! 1. An already-structured value carrying every hack key
//! 2. Strict parse of the text (after stripping a code fence)
//! 3. Strict parse of the first balanced `{...}` / `[...]` span

use crate::hack::{has_hack_keys, HackIdea};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Fenced code block with an optional, case-insensitive `json` tag
const FENCE_PATTERN: &str = r"(?is)```(?:json)?[ \t]*\r?\n(.*?)```";

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(FENCE_PATTERN).expect("FENCE_PATTERN is checked in tests"))
}

/// Return the inner content of the first fenced code block, if any.
pub fn strip_fences(text: &str) -> Option<&str> {
    fence_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|inner| inner.as_str().trim())
        .filter(|inner| !inner.is_empty())
}

/// Locate the first balanced JSON object or array in `text`.
///
/// Only the bracket kind that opens the span is counted, and brackets
/// inside string literals are skipped. Returns `None` if the span never
/// closes, which is how truncated output shows up.
pub fn balanced_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let open = text[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                let end = start + offset + ch.len_utf8();
                return Some(&text[start..end]);
            }
        }
    }

    None
}

/// Pull a JSON value out of free-form model text.
pub fn extract_json(text: &str) -> Option<Value> {
    let candidate = strip_fences(text).unwrap_or_else(|| text.trim());
    if candidate.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Some(value);
    }

    balanced_json_span(candidate).and_then(|span| serde_json::from_str(span).ok())
}

/// Turn raw model output into a normalized [`HackIdea`].
///
/// `raw` may be a string of model text or an already parsed value.
pub fn extract_structured(raw: &Value) -> Option<HackIdea> {
    if has_hack_keys(raw) {
        return HackIdea::from_value(raw);
    }

    match raw {
        Value::String(text) => extract_json(text).and_then(|value| HackIdea::from_value(&value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hack::Difficulty;
    use serde_json::json;

    const IDEA: &str = r#"{"title":"Use Ctrl+Z","description":"Undo anything","category":"Tech","difficulty":"easy","usefulness":150,"bonus":""}"#;

    #[test]
    fn test_fence_pattern_is_valid() {
        assert!(Regex::new(FENCE_PATTERN).is_ok());
    }

    #[test]
    fn test_strip_fences() {
        let text = format!("```json\n{}\n```", IDEA);
        assert_eq!(strip_fences(&text), Some(IDEA));

        let untagged = format!("Here you go:\n```\n{}\n```\nEnjoy!", IDEA);
        assert_eq!(strip_fences(&untagged), Some(IDEA));

        let upper = format!("```JSON\n{}\n```", IDEA);
        assert_eq!(strip_fences(&upper), Some(IDEA));

        assert_eq!(strip_fences(IDEA), None);
    }

    #[test]
    fn test_balanced_span_object() {
        let text = format!("Sure! {} Hope that helps {{not json}}", IDEA);
        assert_eq!(balanced_json_span(&text), Some(IDEA));
    }

    #[test]
    fn test_balanced_span_nested_and_array() {
        let text = r#"prefix [{"a":[1,2]},{"b":3}] suffix ]"#;
        assert_eq!(balanced_json_span(text), Some(r#"[{"a":[1,2]},{"b":3}]"#));

        let nested = r#"x {"a":{"b":{"c":1}}} y"#;
        assert_eq!(balanced_json_span(nested), Some(r#"{"a":{"b":{"c":1}}}"#));
    }

    #[test]
    fn test_balanced_span_ignores_brackets_in_strings() {
        let text = r#"{"title":"Use } and { wisely","note":"say \"}\""} trailing"#;
        assert_eq!(
            balanced_json_span(text),
            Some(r#"{"title":"Use } and { wisely","note":"say \"}\""}"#)
        );
    }

    #[test]
    fn test_balanced_span_truncated() {
        assert_eq!(balanced_json_span(r#"{"title":"Cut off","description":"The mod"#), None);
        assert_eq!(balanced_json_span("no brackets at all"), None);
    }

    #[test]
    fn test_extract_json_paths() {
        assert!(extract_json(IDEA).is_some());
        assert!(extract_json(&format!("```json\n{}\n```", IDEA)).is_some());
        assert!(extract_json(&format!("The hack:\n{}\nThanks.", IDEA)).is_some());
        assert!(extract_json("").is_none());
        assert!(extract_json("Just some prose about hacks.").is_none());
    }

    #[test]
    fn test_truncated_json_is_a_failure() {
        let truncated = r#"```json
{"title":"Use Ctrl+Z","description":"Undo anyth
```"#;
        assert!(extract_json(truncated).is_none());
        assert!(extract_json(r#"{"title":"Use Ctrl+Z","usefulness":"#).is_none());
    }

    #[test]
    fn test_extract_structured_fenced() {
        let raw = json!(format!("```json\n{}\n```", IDEA));
        let idea = extract_structured(&raw).unwrap();
        assert_eq!(idea.title, "Use Ctrl+Z");
        assert_eq!(idea.difficulty, Difficulty::Easy);
        assert_eq!(idea.usefulness, 100);
    }

    #[test]
    fn test_extract_structured_prebuilt_object() {
        let raw: Value = serde_json::from_str(IDEA).unwrap();
        let idea = extract_structured(&raw).unwrap();
        assert_eq!(idea.category, "Tech");
        assert_eq!(idea.usefulness, 100);
    }

    #[test]
    fn test_extract_structured_rejects_other_values() {
        assert!(extract_structured(&json!(42)).is_none());
        assert!(extract_structured(&json!({ "title": "partial" })).is_none());
        assert!(extract_structured(&json!("no json here")).is_none());
    }

    #[test]
    fn test_every_shaped_input_yields_all_keys() {
        let wrappers = [
            IDEA.to_string(),
            format!("```json\n{}\n```", IDEA),
            format!("```\n{}\n```", IDEA),
            format!("Answer: {} -- done", IDEA),
        ];
        for text in wrappers {
            let idea = extract_structured(&json!(text)).unwrap();
            let value = serde_json::to_value(&idea).unwrap();
            assert!(has_hack_keys(&value), "missing keys for {}", text);
        }
    }
}

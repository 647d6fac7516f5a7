//! Upstream response structures

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the model listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListing {
    /// Resource name, e.g. `models/gemini-1.5-flash`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Methods the model can be invoked with
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelListing {
    pub fn supports(&self, capability: &str) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == capability)
    }
}

/// Body of `GET {namespace}/models`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelListing>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Text and metadata from a `:generateContent` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Concatenated text parts of the first candidate
    pub text: String,

    /// Finish reason reported by the first candidate
    pub finish_reason: Option<String>,

    /// Model version that produced the answer
    pub model_version: Option<String>,
}

impl GenerateResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Read the first candidate out of a raw response body.
    ///
    /// Missing or malformed fields yield empty text rather than an error.
    pub fn from_value(json: &Value) -> Self {
        let candidate = &json["candidates"][0];

        let text = candidate["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Self {
            text,
            finish_reason: candidate["finishReason"].as_str().map(str::to_string),
            model_version: json["modelVersion"].as_str().map(str::to_string),
        }
    }

    /// Whether the output was cut off by the output-length cap
    pub fn truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("MAX_TOKENS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_listing() {
        let body = json!({
            "models": [
                {
                    "name": "models/gemini-1.5-flash",
                    "displayName": "Gemini 1.5 Flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                { "name": "models/embedding-001" }
            ],
            "nextPageToken": "abc"
        });
        let parsed: ListModelsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.models.len(), 2);
        assert!(parsed.models[0].supports("generateContent"));
        assert!(!parsed.models[1].supports("generateContent"));
        assert_eq!(parsed.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_generation() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "{\"title\":" }, { "text": "\"x\"}" }]
                },
                "finishReason": "MAX_TOKENS"
            }],
            "modelVersion": "gemini-1.5-flash-002"
        });
        let parsed = GenerateResponse::from_value(&body);
        assert_eq!(parsed.text, "{\"title\":\"x\"}");
        assert!(parsed.truncated());
        assert_eq!(parsed.model_version.as_deref(), Some("gemini-1.5-flash-002"));
    }

    #[test]
    fn test_parse_empty_generation() {
        let parsed = GenerateResponse::from_value(&json!({ "promptFeedback": {} }));
        assert_eq!(parsed.text, "");
        assert!(!parsed.truncated());
    }
}

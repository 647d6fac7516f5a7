//! Content generation request structures

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Sampling and output controls sent as `generationConfig`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Ask the API to return `application/json` directly
    pub force_json: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 400,
            force_json: false,
        }
    }
}

/// A single-turn prompt to send upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub params: GenerationParams,
}

impl GenerateRequest {
    pub fn new(prompt: String) -> Self {
        Self {
            prompt,
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Same request with a different output budget
    pub fn with_max_output_tokens(&self, max_output_tokens: u32) -> Self {
        let mut request = self.clone();
        request.params.max_output_tokens = max_output_tokens;
        request
    }

    /// Wire body for `:generateContent`
    pub fn to_body(&self) -> Value {
        let mut generation_config = json!({
            "temperature": self.params.temperature,
            "maxOutputTokens": self.params.max_output_tokens,
        });

        if self.params.force_json {
            generation_config["responseMimeType"] = json!("application/json");
        }

        json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": self.prompt }]
                }
            ],
            "generationConfig": generation_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let body = GenerateRequest::new("hello".to_string()).to_body();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 400);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_forced_json_and_budget() {
        let request = GenerateRequest::new("hi".to_string()).with_params(GenerationParams {
            force_json: true,
            ..Default::default()
        });
        let bigger = request.with_max_output_tokens(1024);
        let body = bigger.to_body();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(request.params.max_output_tokens, 400);
    }
}

//! Upstream generative-language API layer

mod client;
mod request;
mod response;

pub use client::GeminiClient;
pub use request::{GenerateRequest, GenerationParams};
pub use response::{GenerateResponse, ListModelsResponse, ModelListing};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default host of the Gemini REST API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Capability a model must advertise to answer prompts
pub const GENERATE_CONTENT: &str = "generateContent";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Missing API key")]
    MissingCredential,

    #[error("Model not found: {model}")]
    ModelNotFound { model: String, body: String },

    #[error("Provider error: {status} {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    /// The request URL carries the API key, so it never reaches the message
    fn from(error: reqwest::Error) -> Self {
        ApiError::Http(error.without_url())
    }
}

/// Connection settings for the upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Address of a model: the API version namespace plus the model resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    pub namespace: String,
    pub name: String,
}

impl ModelRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
        .normalized()
    }

    /// Ensure the name is in `models/<id>` form
    pub fn normalized(mut self) -> Self {
        let trimmed = self.name.trim().trim_start_matches('/');
        if !trimmed.starts_with("models/") {
            self.name = format!("models/{}", trimmed);
        } else if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
        self.namespace = self.namespace.trim().trim_matches('/').to_string();
        self
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Operations the proxy needs from the upstream API
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    /// List every model visible under a version namespace
    async fn list_models(&self, namespace: &str) -> Result<Vec<ModelListing>, ApiError>;

    /// Run a single content generation against one model
    async fn generate_content(
        &self,
        target: &ModelRef,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, ApiError>;

    /// Whether a credential is configured at all
    fn has_credential(&self) -> bool;
}

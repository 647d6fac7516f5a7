//! hack-proxy - Turn free-text prompts into structured hack ideas
//!
//! This library sits between a browser client and the Gemini generative
//! API. It picks a model at runtime, asks it for one "hack" as strict JSON
//! and normalizes whatever comes back.
//!
//! ## Key Features
//!
//! - **Model Discovery**: Lists the API's models per version namespace and ranks them
//! - **Candidate Fallback**: Walks static fallbacks when a model is gone
//! - **Tolerant Parsing**: Accepts fenced, bare or prose-wrapped JSON
//! - **Normalization**: Coerces difficulty and clamps usefulness to 0..=100
//! - **HTTP Endpoint**: CORS-enabled `axum` route with a single shared deadline

pub mod api;
pub mod config;
pub mod discovery;
pub mod hack;
pub mod lang;
pub mod orchestrator;
pub mod parser;
pub mod server;
pub mod tui;

pub use api::{ApiConfig, ApiError, GeminiClient, GenerativeApi, ModelRef};
pub use config::{Config, ConfigBuilder, ConfigError};
pub use discovery::{ModelCandidate, ModelDiscovery};
pub use hack::{Difficulty, HackIdea};
pub use lang::Lang;
pub use orchestrator::{
    GenerateError, Generation, GenerationOutcome, Orchestrator, OrchestratorConfig,
};
pub use server::AppState;

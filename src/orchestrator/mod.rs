//! Generation orchestration with model fallback
//!
//! A single generation moves through:
//! `Building -> Discovering -> Calling -> Parsing -> {Done | Diagnostic}`.
//! A candidate answering "model not found" sends the walk on to the next
//! candidate; any other upstream failure ends it. Everything after
//! `Building` runs under one deadline.

mod prompt;

pub use prompt::{build_prompt, DEFAULT_USER_PROMPT};

use crate::api::{
    ApiError, GenerateRequest, GenerationParams, GenerativeApi, ModelRef, GENERATE_CONTENT,
};
use crate::discovery::{ModelDiscovery, NamespaceSurvey};
use crate::hack::HackIdea;
use crate::lang::resolve_hint;
use crate::parser::{extract_json, extract_structured};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upper bound on calls to one model when output is truncated
const MAX_GENERATION_ATTEMPTS: u32 = 2;

pub const PARSE_FAILURE: &str = "Model output could not be parsed as JSON";
pub const SHAPE_FAILURE: &str = "Model output did not match the expected hack shape";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Missing GEMINI_API_KEY on server")]
    MissingCredential,

    #[error("No compatible model found for generateContent.")]
    NoCompatibleModel,

    #[error("Upstream error: {status} {body}")]
    Upstream {
        model: ModelRef,
        status: u16,
        body: String,
    },

    #[error("Upstream request failed: {source}")]
    Transport {
        model: ModelRef,
        #[source]
        source: ApiError,
    },

    #[error("Upstream timeout")]
    Timeout,
}

impl GenerateError {
    /// Model that was being called when the error happened
    pub fn model(&self) -> Option<&ModelRef> {
        match self {
            GenerateError::Upstream { model, .. } | GenerateError::Transport { model, .. } => {
                Some(model)
            }
            _ => None,
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Version namespaces searched by discovery, in order
    pub namespaces: Vec<String>,
    /// Whether to ask the API which models exist before falling back
    pub discovery: bool,
    /// Models tried after the discovered one
    pub fallback_models: Vec<ModelRef>,
    pub params: GenerationParams,
    /// Output budget for the single retry after a truncated answer
    pub retry_max_output_tokens: u32,
    /// Deadline shared by discovery and generation
    pub timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            namespaces: vec!["v1beta".to_string(), "v1".to_string()],
            discovery: true,
            fallback_models: vec![
                ModelRef::new("v1beta", "gemini-1.5-flash-latest"),
                ModelRef::new("v1beta", "gemini-1.5-flash"),
                ModelRef::new("v1", "gemini-1.5-flash"),
            ],
            params: GenerationParams::default(),
            retry_max_output_tokens: 1024,
            timeout: Duration::from_secs(20),
        }
    }
}

/// Where a generation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Building,
    Discovering,
    Calling,
    Parsing,
    Done,
    Diagnostic,
}

/// What the model's answer turned into
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Idea(HackIdea),
    /// The model answered but the answer could not be shaped
    Diagnostic { reason: String, raw: Value },
}

impl GenerationOutcome {
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, GenerationOutcome::Diagnostic { .. })
    }
}

/// A finished generation and the model that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub model: ModelRef,
    pub outcome: GenerationOutcome,
}

/// Shape raw model text into an idea, or a diagnostic carrying the raw output.
pub fn interpret_output(text: &str) -> GenerationOutcome {
    if let Some(idea) = extract_structured(&Value::String(text.to_string())) {
        return GenerationOutcome::Idea(idea);
    }

    match extract_json(text) {
        Some(value) => GenerationOutcome::Diagnostic {
            reason: SHAPE_FAILURE.to_string(),
            raw: value,
        },
        None => GenerationOutcome::Diagnostic {
            reason: PARSE_FAILURE.to_string(),
            raw: if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            },
        },
    }
}

fn enter(stage: GenerationStage) {
    debug!(?stage, "generation stage");
}

/// Turns prompts into hack ideas against an upstream API
pub struct Orchestrator<C: GenerativeApi + ?Sized> {
    config: OrchestratorConfig,
    client: Arc<C>,
    discovery: ModelDiscovery<C>,
}

impl<C: GenerativeApi + ?Sized> Orchestrator<C> {
    pub fn new(config: OrchestratorConfig, client: Arc<C>) -> Self {
        let discovery = ModelDiscovery::new(client.clone(), config.namespaces.clone());
        Self {
            config,
            client,
            discovery,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn discovery(&self) -> &ModelDiscovery<C> {
        &self.discovery
    }

    /// Generate one hack idea for `user_prompt`.
    pub async fn generate(
        &self,
        user_prompt: &str,
        lang_hint: Option<&str>,
    ) -> Result<Generation, GenerateError> {
        enter(GenerationStage::Building);
        if !self.client.has_credential() {
            return Err(GenerateError::MissingCredential);
        }

        let hint = resolve_hint(lang_hint, user_prompt);
        let request = GenerateRequest::new(build_prompt(user_prompt, &hint))
            .with_params(self.config.params.clone());

        match tokio::time::timeout(self.config.timeout, self.run(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Generation exceeded {:?}", self.config.timeout);
                Err(GenerateError::Timeout)
            }
        }
    }

    /// List every namespace under the same deadline as a generation
    pub async fn survey(&self) -> Result<Vec<NamespaceSurvey>, GenerateError> {
        if !self.client.has_credential() {
            return Err(GenerateError::MissingCredential);
        }

        tokio::time::timeout(self.config.timeout, self.discovery.survey())
            .await
            .map_err(|_| {
                warn!("Model survey exceeded {:?}", self.config.timeout);
                GenerateError::Timeout
            })
    }

    /// Discovered model first, then the static fallbacks, without duplicates
    pub async fn candidates(&self) -> Vec<ModelRef> {
        let mut out = Vec::new();

        if self.config.discovery {
            match self.discovery.discover(GENERATE_CONTENT).await {
                Some(candidate) => out.push(candidate.model_ref()),
                None => warn!("Discovery found no model, using fallback list"),
            }
        }

        for fallback in &self.config.fallback_models {
            let fallback = fallback.clone().normalized();
            if !out.contains(&fallback) {
                out.push(fallback);
            }
        }

        out
    }

    async fn run(&self, request: &GenerateRequest) -> Result<Generation, GenerateError> {
        enter(GenerationStage::Discovering);
        let candidates = self.candidates().await;
        if candidates.is_empty() {
            return Err(GenerateError::NoCompatibleModel);
        }

        for target in candidates {
            enter(GenerationStage::Calling);
            match self.call_model(&target, request).await {
                Ok(outcome) => {
                    if outcome.is_diagnostic() {
                        enter(GenerationStage::Diagnostic);
                        warn!("{} answered with unparseable output", target);
                    } else {
                        enter(GenerationStage::Done);
                        info!("Generated hack with {}", target);
                    }
                    return Ok(Generation {
                        model: target,
                        outcome,
                    });
                }
                Err(ApiError::ModelNotFound { model, .. }) => {
                    warn!("Model {} not found, trying next candidate", model);
                }
                Err(ApiError::MissingCredential) => return Err(GenerateError::MissingCredential),
                Err(ApiError::Status { status, body }) => {
                    return Err(GenerateError::Upstream {
                        model: target,
                        status,
                        body,
                    })
                }
                Err(source) => {
                    return Err(GenerateError::Transport {
                        model: target,
                        source,
                    })
                }
            }
        }

        Err(GenerateError::NoCompatibleModel)
    }

    /// Call one model, retrying once with a bigger budget on truncated output
    async fn call_model(
        &self,
        target: &ModelRef,
        request: &GenerateRequest,
    ) -> Result<GenerationOutcome, ApiError> {
        let mut current = request.clone();
        let mut attempt = 1;

        loop {
            let response = self.client.generate_content(target, &current).await?;

            enter(GenerationStage::Parsing);
            let outcome = interpret_output(&response.text);

            let can_retry = attempt < MAX_GENERATION_ATTEMPTS
                && response.truncated()
                && self.config.retry_max_output_tokens > current.params.max_output_tokens;

            if outcome.is_diagnostic() && can_retry {
                info!(
                    "Output from {} truncated at {} tokens, retrying with {}",
                    target, current.params.max_output_tokens, self.config.retry_max_output_tokens
                );
                current = request.with_max_output_tokens(self.config.retry_max_output_tokens);
                attempt += 1;
                continue;
            }

            return Ok(outcome);
        }
    }
}

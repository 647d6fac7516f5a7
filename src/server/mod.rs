//! HTTP boundary around the orchestrator
//!
//! One endpoint accepts `POST {prompt?, langHint?}` and answers with either a
//! normalized hack, a `{error, raw}` diagnostic (still 200), or an
//! `{error}` envelope with a failure status. Every response carries
//! permissive CORS headers.

use crate::api::{GenerativeApi, ModelRef};
use crate::config::PromptSettings;
use crate::orchestrator::{GenerateError, GenerationOutcome, Orchestrator};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Namespace that answered the request
pub const MODEL_BASE_HEADER: &str = "x-gemini-base";
/// Model that answered the request
pub const MODEL_NAME_HEADER: &str = "x-gemini-model";

/// Body accepted by the generate endpoint: `{prompt?, langHint?}`
#[derive(Debug, Default)]
pub struct HackRequest {
    pub prompt: Option<String>,
    pub lang_hint: Option<String>,
}

/// Shared state for request handlers
pub struct AppState<C: GenerativeApi + ?Sized> {
    orchestrator: Orchestrator<C>,
    defaults: PromptSettings,
}

impl<C: GenerativeApi + ?Sized> AppState<C> {
    pub fn new(orchestrator: Orchestrator<C>, defaults: PromptSettings) -> Self {
        Self {
            orchestrator,
            defaults,
        }
    }
}

/// Build the router with the generate endpoint mounted at `route`
pub fn router<C>(state: Arc<AppState<C>>, route: &str) -> Router
where
    C: GenerativeApi + ?Sized + 'static,
{
    Router::new()
        .route(route, any(hack_handler::<C>))
        .fallback(not_found)
        .layer(middleware::map_response(with_cors))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve<C>(state: Arc<AppState<C>>, addr: &str, route: &str) -> std::io::Result<()>
where
    C: GenerativeApi + ?Sized + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}{}", listener.local_addr()?, route);

    axum::serve(listener, router(state, route))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn hack_handler<C>(
    State(state): State<Arc<AppState<C>>>,
    method: Method,
    body: Bytes,
) -> Response
where
    C: GenerativeApi + ?Sized + 'static,
{
    match method {
        Method::OPTIONS => StatusCode::NO_CONTENT.into_response(),
        Method::POST => generate(&state, &body).await,
        other => {
            debug!("Rejected {} request", other);
            let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
            response
        }
    }
}

async fn generate<C>(state: &AppState<C>, body: &[u8]) -> Response
where
    C: GenerativeApi + ?Sized,
{
    let request = parse_request(body);

    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.defaults.default_prompt.clone());
    let lang_hint = request
        .lang_hint
        .unwrap_or_else(|| state.defaults.default_lang_hint.clone());

    match state.orchestrator.generate(&prompt, Some(&lang_hint)).await {
        Ok(generation) => {
            let mut response = match generation.outcome {
                GenerationOutcome::Idea(idea) => (StatusCode::OK, Json(idea)).into_response(),
                GenerationOutcome::Diagnostic { reason, raw } => {
                    warn!("{}: {}", reason, raw);
                    (StatusCode::OK, Json(json!({ "error": reason, "raw": raw }))).into_response()
                }
            };
            attach_model_headers(&mut response, &generation.model);
            response
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Generation failed: {}", e);
            } else {
                warn!("Generation failed: {}", e);
            }

            let mut response = error_response(status, &e.to_string());
            if let Some(model) = e.model() {
                attach_model_headers(&mut response, model);
            }
            response
        }
    }
}

/// Lenient body parsing.
///
/// Each field is read on its own, so a missing or mistyped field only loses
/// itself. Empty or unreadable bodies fall back to defaults entirely.
fn parse_request(body: &[u8]) -> HackRequest {
    if body.iter().all(u8::is_ascii_whitespace) {
        return HackRequest::default();
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            debug!("Ignoring unreadable request body: {}", e);
            return HackRequest::default();
        }
    };

    let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
    HackRequest {
        prompt: field("prompt"),
        lang_hint: field("langHint"),
    }
}

/// HTTP status for each generation failure
pub fn status_for(error: &GenerateError) -> StatusCode {
    match error {
        GenerateError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
        GenerateError::NoCompatibleModel => StatusCode::NOT_FOUND,
        GenerateError::Upstream { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        GenerateError::Transport { .. } => StatusCode::BAD_GATEWAY,
        GenerateError::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn attach_model_headers(response: &mut Response, model: &ModelRef) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&model.namespace) {
        headers.insert(HeaderName::from_static(MODEL_BASE_HEADER), value);
    }
    if let Ok(value) = HeaderValue::from_str(&model.name) {
        headers.insert(HeaderName::from_static(MODEL_NAME_HEADER), value);
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

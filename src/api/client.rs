//! Gemini REST client

use super::{
    ApiConfig, ApiError, GenerateRequest, GenerateResponse, GenerativeApi, ListModelsResponse,
    ModelListing, ModelRef,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Listing pages followed before giving up on a namespace
const MAX_LISTING_PAGES: usize = 5;

/// Client for the `generativelanguage` REST API.
///
/// The key travels as the `key` query parameter and is never logged.
pub struct GeminiClient {
    config: ApiConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn api_key(&self) -> Result<&str, ApiError> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingCredential)
    }
}

#[async_trait]
impl GenerativeApi for GeminiClient {
    async fn list_models(&self, namespace: &str) -> Result<Vec<ModelListing>, ApiError> {
        let key = self.api_key()?;
        let url = format!("{}/{}/models", self.base_url(), namespace);

        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LISTING_PAGES {
            let mut query = vec![("key", key.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self.client.get(&url).query(&query).send().await?;
            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let page: ListModelsResponse = response.json().await?;
            debug!("{} listed {} models", namespace, page.models.len());
            models.extend(page.models);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }

    async fn generate_content(
        &self,
        target: &ModelRef,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, ApiError> {
        let key = self.api_key()?;
        let url = format!(
            "{}/{}/{}:generateContent",
            self.base_url(),
            target.namespace,
            target.name
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .header("Content-Type", "application/json")
            .json(&request.to_body())
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            Ok(GenerateResponse::from_value(&json))
        } else if status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::ModelNotFound {
                model: target.to_string(),
                body,
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn has_credential(&self) -> bool {
        self.api_key().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(ApiConfig {
            api_key: Some("test-key".to_string()),
            base_url: server.uri(),
        })
    }

    #[tokio::test]
    async fn test_list_models_follows_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(query_param("key", "test-key"))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    { "name": "models/b", "supportedGenerationMethods": ["generateContent"] }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "models/a", "supportedGenerationMethods": [] }],
                "nextPageToken": "next"
            })))
            .mount(&server)
            .await;

        let models = client_for(&server).list_models("v1beta").await.unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["models/a", "models/b"]);
    }

    #[tokio::test]
    async fn test_list_models_status_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_models("v1").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_generate_content_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "maxOutputTokens": 400 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "hello" }] },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let target = ModelRef::new("v1beta", "gemini-1.5-flash");
        let response = client_for(&server)
            .generate_content(&target, &GenerateRequest::new("hi".to_string()))
            .await
            .unwrap();

        assert_eq!(response.text, "hello");
        assert!(!response.truncated());
    }

    #[tokio::test]
    async fn test_generate_content_not_found() {
        let server = MockServer::start().await;

        let target = ModelRef::new("v1", "gemini-missing");
        let err = client_for(&server)
            .generate_content(&target, &GenerateRequest::new("hi".to_string()))
            .await
            .unwrap_err();

        match err {
            ApiError::ModelNotFound { model, .. } => assert_eq!(model, "v1/models/gemini-missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_content_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let target = ModelRef::new("v1", "gemini-pro");
        let response = client_for(&server)
            .generate_content(&target, &GenerateRequest::new("hi".to_string()))
            .await
            .unwrap();
        assert_eq!(response.text, "");
    }

    /// Address with nothing listening on it
    async fn closed_port_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_transport_error_hides_key() {
        let client = GeminiClient::new(ApiConfig {
            api_key: Some("SECRET-KEY-123".to_string()),
            base_url: closed_port_url().await,
        });

        let target = ModelRef::new("v1beta", "gemini-1.5-flash");
        let err = client
            .generate_content(&target, &GenerateRequest::new("hi".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);

        let err = client.list_models("v1beta").await.unwrap_err();
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = GeminiClient::new(ApiConfig::default());
        assert!(!client.has_credential());
        let err = client.list_models("v1").await.unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential));
    }
}

//! Embedding provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Header carrying the Gemini API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text.
    ///
    /// # Errors
    /// - [`EmbedError::EmptyInput`] when `text` is empty after trimming
    /// - [`EmbedError::ModelError`] when the model rejects the input
    /// - [`EmbedError::EmbeddingUnavailable`] on transport, auth, or timeout failure
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimension of the vectors this provider returns, once known.
    ///
    /// Remote providers only learn this from their first successful response.
    fn embedding_dimension(&self) -> Option<usize>;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;

    /// Get the name of the model behind this provider
    fn model_name(&self) -> &str;
}

/// Embedding provider backed by the Gemini `embedContent` REST method.
#[derive(Clone)]
pub struct GeminiProvider {
    config: EmbedConfig,
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    dimension: std::sync::Arc<OnceLock<usize>>,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.config.model)
            .field("dimension", &self.dimension.get())
            .finish()
    }
}

impl GeminiProvider {
    /// Build a provider whose credential comes from the environment.
    ///
    /// A missing credential is reported here, at startup, and never as a
    /// per-call failure.
    pub fn from_env(config: EmbedConfig) -> Result<Self> {
        let api_key = config.api_key_from_env()?;
        Self::new(config, api_key)
    }

    /// Build a provider with an explicit credential.
    pub fn new(config: EmbedConfig, api_key: impl Into<String>) -> Result<Self> {
        config.validate()?;
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EmbedError::invalid_config("missing API key"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmbedError::invalid_config(format!("failed to build HTTP client: {e}")))?;

        let endpoint = config.endpoint();
        tracing::debug!("Embedding endpoint: {}", endpoint);

        Ok(Self {
            config,
            client,
            endpoint,
            api_key,
            dimension: Default::default(),
        })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// Pin the dimension on first success and reject any later drift.
    fn accept_vector(&self, values: Vec<f32>) -> Result<Vec<f32>> {
        if values.is_empty() {
            return Err(EmbedError::model_error("model returned an empty embedding"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::model_error(
                "model returned non-finite values in embedding",
            ));
        }

        let expected = *self.dimension.get_or_init(|| {
            tracing::info!(
                "Embedding dimension for {} is {}",
                self.config.model,
                values.len()
            );
            values.len()
        });

        if values.len() != expected {
            return Err(EmbedError::model_error(format!(
                "expected dimension {expected}, got {}",
                values.len()
            )));
        }

        Ok(values)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let request = EmbedContentRequest::new(text);
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(EmbedError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(classify_failure(status, &body));
        }

        let parsed: EmbedContentResponse = response.json().await.map_err(|e| {
            EmbedError::unavailable(format!("unexpected embedding response body: {e}"))
        })?;

        tracing::debug!(
            "Embedded {} characters into {} values",
            text.chars().count(),
            parsed.embedding.values.len()
        );
        self.accept_vector(parsed.embedding.values)
    }

    fn embedding_dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Map a non-success HTTP status onto the gateway taxonomy.
///
/// Credential, throttling, and server-side failures mean the service is
/// unavailable; any other client error means the model refused this input.
fn classify_failure(status: StatusCode, body: &str) -> EmbedError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS => {
            EmbedError::unavailable(format!("HTTP {status}: {detail}"))
        }
        s if s.is_server_error() => EmbedError::unavailable(format!("HTTP {status}: {detail}")),
        _ => EmbedError::model_error(format!("HTTP {status}: {detail}")),
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
}

impl<'a> EmbedContentRequest<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            content: Content {
                parts: vec![Part { text }],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_provider() -> GeminiProvider {
        // Port 1 is never listening, so any request fails fast with a connect error.
        let config = EmbedConfig::default().with_base_url("http://127.0.0.1:1");
        GeminiProvider::new(config, "test-key").unwrap()
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(EmbedContentRequest::new("what is borrowing")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": {"parts": [{"text": "what is borrowing"}]}})
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"embedding": {"values": [0.25, -0.5, 1.0]}}"#;
        let parsed: EmbedContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_classify_failure() {
        let rejected = r#"{"error": {"code": 400, "message": "input exceeds token limit", "status": "INVALID_ARGUMENT"}}"#;
        match classify_failure(StatusCode::BAD_REQUEST, rejected) {
            EmbedError::ModelError { message } => {
                assert!(message.contains("input exceeds token limit"))
            }
            other => panic!("expected ModelError, got {other:?}"),
        }

        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            assert!(
                matches!(
                    classify_failure(status, "nope"),
                    EmbedError::EmbeddingUnavailable { .. }
                ),
                "{status} should be unavailable"
            );
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = offline_provider();

        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model_name(), "gemini-embedding-001");
        assert_eq!(provider.embedding_dimension(), None);
    }

    #[test]
    fn test_blank_key_rejected() {
        let err = GeminiProvider::new(EmbedConfig::default(), "  ").unwrap_err();
        assert!(matches!(err, EmbedError::InvalidConfig { .. }));
    }

    #[test]
    fn test_dimension_pinned_by_first_vector() {
        let provider = offline_provider();

        assert_eq!(provider.accept_vector(vec![0.1, 0.2, 0.3]).unwrap().len(), 3);
        assert_eq!(provider.embedding_dimension(), Some(3));

        let err = provider.accept_vector(vec![0.1, 0.2]).unwrap_err();
        assert!(matches!(err, EmbedError::ModelError { .. }));
    }

    #[test]
    fn test_empty_and_non_finite_vectors_rejected() {
        let provider = offline_provider();

        assert!(matches!(
            provider.accept_vector(vec![]),
            Err(EmbedError::ModelError { .. })
        ));
        assert!(matches!(
            provider.accept_vector(vec![0.1, f32::NAN]),
            Err(EmbedError::ModelError { .. })
        ));
        // Rejected vectors must not pin the dimension.
        assert_eq!(provider.embedding_dimension(), None);
    }

    #[tokio::test]
    async fn test_empty_input_fails_before_request() {
        let provider = offline_provider();

        assert!(matches!(
            provider.embed_text("").await,
            Err(EmbedError::EmptyInput)
        ));
        assert!(matches!(
            provider.embed_text(" \n\t ").await,
            Err(EmbedError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let provider = offline_provider();

        let err = provider.embed_text("hello").await.unwrap_err();
        assert!(matches!(err, EmbedError::EmbeddingUnavailable { .. }));
    }

    #[tokio::test]
    #[ignore] // Integration test: calls the real Gemini API - run with: GEMINI_API_KEY=... cargo test -- --ignored
    async fn test_gemini_embedding_live() -> Result<()> {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();

        let provider = GeminiProvider::from_env(EmbedConfig::default())?;
        let ownership = provider.embed_text("What is ownership in Rust?").await?;
        let borrowing = provider.embed_text("How does borrowing work?").await?;

        assert!(!ownership.is_empty());
        assert_eq!(ownership.len(), borrowing.len());
        assert_eq!(provider.embedding_dimension(), Some(ownership.len()));
        Ok(())
    }
}

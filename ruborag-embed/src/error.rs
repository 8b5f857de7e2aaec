//! Error types for the embedding gateway

/// Result type for embedding operations.
///
/// This is a convenience type alias that uses [`EmbedError`] as the error type.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Every way an embedding request can fail.
///
/// None of these are retried by the gateway. Callers decide whether a failure
/// aborts the surrounding work; the retriever aborts the current file.
///
/// # Error Categories
///
/// - **Transport**: the service could not be reached, timed out, or refused the credential
/// - **Input**: the text was empty, or the model rejected it
/// - **Configuration**: the gateway cannot be constructed at all
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Transport, authentication, or timeout failure talking to the model
    #[error("Embedding service unavailable: {message}")]
    EmbeddingUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The text to embed was empty after trimming
    #[error("Cannot embed empty input")]
    EmptyInput,

    /// The remote model rejected the input or returned an unusable vector
    #[error("Embedding model error: {message}")]
    ModelError { message: String },

    /// The gateway configuration is unusable, e.g. a missing credential
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },
}

impl EmbedError {
    /// Create an unavailability error with a message and no underlying cause.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::EmbeddingUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a transport error, keeping it as the source.
    ///
    /// Timeouts get a distinct message so they are easy to spot in logs.
    pub fn transport(source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            "could not connect to embedding endpoint".to_string()
        } else {
            "request failed".to_string()
        };
        Self::EmbeddingUnavailable {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a model error with a custom message.
    pub fn model_error<S: Into<String>>(message: S) -> Self {
        Self::ModelError {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EmbedError::unavailable("HTTP 503").to_string(),
            "Embedding service unavailable: HTTP 503"
        );
        assert_eq!(EmbedError::EmptyInput.to_string(), "Cannot embed empty input");
        assert_eq!(
            EmbedError::model_error("input too long").to_string(),
            "Embedding model error: input too long"
        );
        assert_eq!(
            EmbedError::invalid_config("GEMINI_API_KEY is not set").to_string(),
            "Invalid embedding configuration: GEMINI_API_KEY is not set"
        );
    }
}

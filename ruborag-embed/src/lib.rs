//! # ruborag-embed
//!
//! The embedding gateway: turns a piece of text into a fixed-length vector by
//! calling a hosted embedding model. Every call is a single network request;
//! nothing is cached and nothing is retried.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ruborag_embed::{EmbedConfig, EmbeddingProvider, GeminiProvider};
//!
//! # async fn example() -> ruborag_embed::Result<()> {
//! // Reads the key from GEMINI_API_KEY; a missing key fails here, not per call.
//! let provider = GeminiProvider::from_env(EmbedConfig::default())?;
//!
//! let vector = provider.embed_text("What does the borrow checker do?").await?;
//! println!("{} dimensions from {}", vector.len(), provider.model_name());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`]: endpoint, model, timeout and credential source
//! - [`provider`]: the [`EmbeddingProvider`] trait and the Gemini implementation
//! - [`error`]: error types and result handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`] type.
//! Transport, credential and timeout failures surface as
//! [`EmbedError::EmbeddingUnavailable`]; inputs the model refuses surface as
//! [`EmbedError::ModelError`].

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::{DEFAULT_API_KEY_ENV, DEFAULT_MODEL, EmbedConfig};
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, GeminiProvider};

//! Settings shared by the `ruborag` commands, optionally loaded from TOML.
//!
//! ```toml
//! db_name = "ruborag.db"
//! eligible_extensions = ["txt", "md"]
//! chunk_size = 800
//! embed_timeout_secs = 90
//!
//! [gemini]
//! model = "gemini-embedding-001"
//! timeout_secs = 30
//! ```
//!
//! Every key is optional. The API key is never read from this file.

use crate::error::{Result, RetrieverError};
use crate::retrieval::ingest::DEFAULT_EMBED_TIMEOUT;
use crate::storage::DEFAULT_DB_NAME;
use ruborag_context::DEFAULT_CHUNK_SIZE;
use ruborag_embed::EmbedConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrieverConfig {
    /// Database file name, relative to the base directory
    pub db_name: String,
    /// Extensions picked up when walking directories, without the dot
    pub eligible_extensions: Vec<String>,
    /// Chunk size in code points when chunking is requested
    pub chunk_size: usize,
    /// Bound on each embedding call made during ingestion
    pub embed_timeout_secs: u64,
    /// Embedding endpoint settings
    pub gemini: EmbedConfig,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            db_name: DEFAULT_DB_NAME.to_string(),
            eligible_extensions: vec!["txt".to_string()],
            chunk_size: DEFAULT_CHUNK_SIZE,
            embed_timeout_secs: DEFAULT_EMBED_TIMEOUT.as_secs(),
            gemini: EmbedConfig::default(),
        }
    }
}

impl RetrieverConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| RetrieverError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| RetrieverError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate().map_err(|message| RetrieverError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.db_name.trim().is_empty() {
            return Err("db_name must not be empty".to_string());
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than zero".to_string());
        }
        if self.embed_timeout_secs == 0 {
            return Err("embed_timeout_secs must be at least one second".to_string());
        }
        self.gemini.validate().map_err(|e| e.to_string())
    }

    pub fn db_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.db_name)
    }

    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = RetrieverConfig::default();

        assert_eq!(config.db_path(Path::new("/data")), PathBuf::from("/data/ruborag.db"));
        assert_eq!(config.eligible_extensions, vec!["txt"]);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.embed_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("ruborag.toml");
        std::fs::write(
            &path,
            r#"
chunk_size = 500
eligible_extensions = ["txt", "md"]

[gemini]
model = "text-embedding-004"
"#,
        )?;

        let config = RetrieverConfig::load(&path)?;

        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.eligible_extensions, vec!["txt", "md"]);
        assert_eq!(config.gemini.model, "text-embedding-004");
        assert_eq!(config.gemini.timeout_secs, 30);
        assert_eq!(config.db_name, "ruborag.db");
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("bad.toml");

        std::fs::write(&path, "chunk_size = 0\n")?;
        assert!(matches!(
            RetrieverConfig::load(&path),
            Err(RetrieverError::Config { .. })
        ));

        std::fs::write(&path, "chunk_sise = 10\n")?;
        assert!(matches!(
            RetrieverConfig::load(&path),
            Err(RetrieverError::Config { .. })
        ));

        assert!(matches!(
            RetrieverConfig::load(&temp_dir.path().join("missing.toml")),
            Err(RetrieverError::Read { .. })
        ));
        Ok(())
    }
}

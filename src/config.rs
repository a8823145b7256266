//! Configuration management for Sandpiper.
//!
//! Configuration can be set via environment variables:
//! - `GEMINI_API_KEY` - Required. Your Google Gemini API key.
//! - `GEMINI_MODEL` - Optional. The model to use. Defaults to `gemini-2.0-flash-001`.
//! - `SANDBOX_ROOT` - Optional. The directory all tool operations are confined
//!   to. Defaults to the current directory.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `20`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub api_key: String,

    /// Model identifier, e.g. `gemini-2.0-flash-001`
    pub model: String,

    /// Directory all tool operations are confined to
    pub sandbox_root: PathBuf,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash-001".to_string());

        let sandbox_root = std::env::var("SANDBOX_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))?;

        Ok(Self {
            api_key,
            model,
            sandbox_root,
            max_iterations,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, model: String, sandbox_root: PathBuf) -> Self {
        Self {
            api_key,
            model,
            sandbox_root,
            max_iterations: 20,
        }
    }
}

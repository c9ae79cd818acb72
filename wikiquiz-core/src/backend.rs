//! Text-generation backends.
//!
//! A backend takes a prompt and returns plain text. Each implementation
//! normalises its own native response shape before returning, so callers
//! only ever see the model's text.

use crate::config::{BackendKind, ModelConfig};
use crate::gemini::GeminiCliBackend;
use crate::gemini_rest::GeminiRestBackend;
use futures::future::BoxFuture;
use thiserror::Error;

/// Errors raised by a single backend attempt
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to spawn model process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Model process failed with exit code {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model returned no text")]
    EmptyResponse,
}

/// Something that can turn a prompt into model text
pub trait ModelBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Send `prompt` and return the generated text
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BackendError>>;
}

/// Build the backend for `kind` from model configuration
pub fn build_backend(
    kind: BackendKind,
    config: &ModelConfig,
) -> Result<Box<dyn ModelBackend>, BackendError> {
    Ok(match kind {
        BackendKind::Cli => Box::new(GeminiCliBackend::from_config(config)),
        BackendKind::Rest => Box::new(GeminiRestBackend::from_config(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_backends_in_configured_order() {
        let config = ModelConfig::default();
        let names: Vec<String> = config
            .backends
            .iter()
            .map(|&kind| build_backend(kind, &config).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["gemini-cli", "gemini-rest"]);
    }
}

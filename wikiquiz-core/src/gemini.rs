//! Gemini CLI backend.
//!
//! Runs the official `gemini` CLI as a child process in non-interactive
//! mode and unwraps its JSON envelope into plain text.

use crate::backend::{BackendError, ModelBackend};
use crate::config::ModelConfig;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Client for the Gemini CLI
pub struct GeminiCliBackend {
    /// Path to the gemini binary
    binary_path: PathBuf,

    /// Model passed with `-m`
    model: String,

    /// Timeout in seconds (0 = no timeout)
    timeout_secs: u64,
}

impl GeminiCliBackend {
    pub fn new(binary_path: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            model: model.into(),
            timeout_secs: 120,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(&config.gemini_binary, &config.model_id).with_timeout(config.cli_timeout_secs)
    }

    /// Set the timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Check if the gemini binary is available
    pub async fn check_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn call(&self, prompt: &str) -> Result<String, BackendError> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-p")
            .arg(prompt)
            .arg("-m")
            .arg(&self.model)
            .arg("--output-format")
            .arg("json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = if self.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(self.timeout_secs),
                cmd.output(),
            )
            .await
            .map_err(|_| BackendError::Timeout(self.timeout_secs))??
        } else {
            cmd.output().await?
        };

        debug!("Gemini CLI exit code: {:?}", output.status.code());

        if !output.status.success() {
            return Err(BackendError::ProcessFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = normalize_cli_output(&String::from_utf8_lossy(&output.stdout));
        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(text)
    }
}

impl ModelBackend for GeminiCliBackend {
    fn name(&self) -> &str {
        "gemini-cli"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BackendError>> {
        Box::pin(self.call(prompt))
    }
}

/// Unwrap the CLI's `--output-format json` envelope.
///
/// The envelope carries the model text under `response` (older builds used
/// `text`, `content` or `output`). Output that is not an envelope is
/// returned as-is.
fn normalize_cli_output(stdout: &str) -> String {
    let trimmed = stdout.trim();

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return trimmed.to_string();
    };

    ["response", "text", "content", "output"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .or_else(|| value.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

impl Default for GeminiCliBackend {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

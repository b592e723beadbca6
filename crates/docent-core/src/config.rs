use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DocentError, Result};

/// Top-level configuration for Docent.
///
/// Loaded from `~/.docent/config.toml` by default. The backend address lives
/// here and is handed to the engine at construction; nothing in the engine
/// reads it from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocentConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl DocentConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DocentConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check values that would leave the engine unusable.
    pub fn validate(&self) -> Result<()> {
        let url = self.backend.base_url.trim();
        if url.is_empty() {
            return Err(DocentError::Config("backend.base_url is empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DocentError::Config(format!(
                "backend.base_url must be an http(s) URL, got {url}"
            )));
        }
        if self.chat.pending_text.is_empty() {
            return Err(DocentError::Config("chat.pending_text is empty".into()));
        }
        if self.chat.error_text.is_empty() {
            return Err(DocentError::Config("chat.error_text is empty".into()));
        }
        if self.chat.event_capacity == 0 {
            return Err(DocentError::Config(
                "chat.event_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Where the Q&A backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base address; request paths such as `/query` are appended to it.
    pub base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            user_agent: concat!("docent/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl BackendConfig {
    /// Join a request path onto the base address without doubling slashes.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Fixed strings and channel sizing for the session engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Content of the placeholder entry while a response is computed.
    pub pending_text: String,
    /// Assistant content written when a request fails.
    pub error_text: String,
    /// Assistant content written when a document answer is absent.
    pub no_answer_text: String,
    /// Value of the `mode` field on conversation requests.
    pub conversation_mode_flag: String,
    /// Capacity of the log-update broadcast channel.
    pub event_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            pending_text: "Thinking...".to_string(),
            error_text: "⚠️ Error connecting to AI backend.".to_string(),
            no_answer_text: "No answer returned.".to_string(),
            conversation_mode_flag: "general".to_string(),
            event_capacity: 256,
        }
    }
}

//! CLI argument definitions for the Docent terminal front end.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Docent: ask questions about a document, or just chat, against a Q&A backend.
#[derive(Parser, Debug)]
#[command(name = "docent", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the Q&A backend.
    #[arg(short = 'b', long = "backend-url")]
    pub backend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Text document to load at startup.
    #[arg(short = 'd', long = "document")]
    pub document: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DOCENT_CONFIG env var > ~/.docent/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("DOCENT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the backend base URL.
    ///
    /// Priority: --backend-url flag > DOCENT_BACKEND_URL env var > config file value.
    pub fn resolve_backend_url(&self, config_url: &str) -> String {
        pick(
            self.backend_url.as_deref(),
            std::env::var("DOCENT_BACKEND_URL").ok().as_deref(),
            config_url,
        )
    }

    /// Resolve the tracing filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_filter_directive(&self, config_level: &str) -> String {
        resolve_filter_directive(
            self.log_level.as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
            config_level,
        )
    }
}

/// Filter directive from the log-level flag, `RUST_LOG`, then the config level.
pub fn resolve_filter_directive(flag: Option<&str>, env: Option<&str>, config: &str) -> String {
    pick(flag, env, config)
}

/// First non-blank of flag, env value, then the config fallback.
fn pick(flag: Option<&str>, env: Option<&str>, fallback: &str) -> String {
    let non_blank = |v: &&str| !v.trim().is_empty();
    flag.filter(non_blank)
        .or(env.filter(non_blank))
        .unwrap_or(fallback)
        .to_string()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".docent").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".docent").join("config.toml");
    }
    PathBuf::from("config.toml")
}

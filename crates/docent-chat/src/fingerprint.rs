//! Document fingerprinting.
//!
//! The primary path hashes the full byte content with SHA-256 and keeps the
//! first 16 hex characters. When the content cannot be read, a printable
//! token is built from the file name, size and modification time instead.
//! Neither path ever returns an error.

use std::path::Path;
use std::time::UNIX_EPOCH;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use docent_core::types::Fingerprint;

/// Length of every fingerprint, in characters.
pub const FINGERPRINT_LEN: usize = 16;

/// File metadata used by the fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    pub name: String,
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub modified_ms: u64,
}

impl DocumentMeta {
    pub fn new(name: impl Into<String>, size: u64, modified_ms: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified_ms,
        }
    }

    /// Build from filesystem metadata. A missing modification time counts as 0.
    pub fn from_fs(name: impl Into<String>, meta: &std::fs::Metadata) -> Self {
        let modified_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::new(name, meta.len(), modified_ms)
    }
}

/// Content fingerprint: SHA-256 over `bytes`, truncated hex.
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    let digest = Sha256::digest(bytes);
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    Fingerprint(hex)
}

/// Fallback fingerprint from `name-size-mtime`, base64 encoded and truncated.
pub fn fingerprint_metadata(meta: &DocumentMeta) -> Fingerprint {
    let raw = format!("{}-{}-{}", meta.name, meta.size, meta.modified_ms);
    let mut token = STANDARD.encode(raw.as_bytes());
    token.truncate(FINGERPRINT_LEN);
    Fingerprint(token)
}

/// Fingerprint a file on disk, falling back to its metadata if it cannot be read.
pub async fn fingerprint_file(path: &Path) -> Fingerprint {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let fp = fingerprint_bytes(&bytes);
            debug!(path = %path.display(), fingerprint = %fp, "Document fingerprinted");
            fp
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Content hashing unavailable, using metadata fingerprint"
            );
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let meta = match tokio::fs::metadata(path).await {
                Ok(m) => DocumentMeta::from_fs(name, &m),
                Err(_) => DocumentMeta::new(name, 0, 0),
            };
            fingerprint_metadata(&meta)
        }
    }
}

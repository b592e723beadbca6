//! Summary and export lookups keyed by document fingerprint.
//!
//! These are thin collaborators: the fingerprint is passed through as an
//! opaque key. Status and summary lookups degrade to empty results on any
//! failure; export reports its error to the caller.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use docent_core::types::Fingerprint;

use super::HttpBackend;
use crate::error::ChatError;

#[derive(Debug, Serialize)]
struct FileHashBody<'a> {
    #[serde(rename = "fileHash")]
    file_hash: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: HashMap<String, bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportResponse {
    #[serde(default)]
    public_url: Option<String>,
}

impl HttpBackend {
    /// Which of `fingerprints` already have a summary. Empty on failure.
    pub async fn summary_status(&self, fingerprints: &[Fingerprint]) -> HashMap<String, bool> {
        match self.try_summary_status(fingerprints).await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Error fetching summary status");
                HashMap::new()
            }
        }
    }

    /// The summary for one document, if the backend has one.
    pub async fn summary(&self, fingerprint: &Fingerprint) -> Option<String> {
        match self.try_summary(fingerprint).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, fingerprint = %fingerprint, "Error fetching summary");
                None
            }
        }
    }

    /// Ask the backend to publish the summary; returns the public URL if any.
    pub async fn export(&self, fingerprint: &Fingerprint) -> Result<Option<String>, ChatError> {
        let response = self
            .client()
            .post(self.endpoint("export"))
            .json(&FileHashBody {
                file_hash: fingerprint.as_str(),
            })
            .send()
            .await?
            .error_for_status()?;
        let body: ExportResponse = response.json().await?;
        Ok(body.public_url)
    }

    async fn try_summary_status(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<HashMap<String, bool>, ChatError> {
        let response = self
            .client()
            .post(self.endpoint("summary/status"))
            .json(fingerprints)
            .send()
            .await?
            .error_for_status()?;
        let body: StatusResponse = response.json().await?;
        Ok(body.status)
    }

    async fn try_summary(&self, fingerprint: &Fingerprint) -> Result<Option<String>, ChatError> {
        let response = self
            .client()
            .post(self.endpoint("summary"))
            .json(&FileHashBody {
                file_hash: fingerprint.as_str(),
            })
            .send()
            .await?
            .error_for_status()?;
        let body: SummaryResponse = response.json().await?;
        Ok(body.summary)
    }
}

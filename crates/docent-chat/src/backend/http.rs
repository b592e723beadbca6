use futures::StreamExt;
use reqwest::Client;
use tracing::debug;

use docent_core::config::BackendConfig;

use super::{AskRequest, AskResponse, ChatBackend, ConversationRequest, FragmentStream};
use crate::error::ChatError;

/// HTTP client for the Q&A backend.
///
/// The base address comes from [`BackendConfig`] at construction.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }
}

impl ChatBackend for HttpBackend {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ChatError> {
        let url = self.endpoint("query");
        debug!(%url, chunks = request.chunks.len(), "Sending document question");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<AskResponse>().await?)
    }

    async fn chat(&self, request: &ConversationRequest) -> Result<FragmentStream, ChatError> {
        let url = self.endpoint("chat");
        debug!(
            %url,
            messages = request.messages.len(),
            session = %request.session,
            "Opening conversation stream"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ChatError::from))
            .boxed())
    }
}

use crate::config::Config;
use crate::error::ApiError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Body of a single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
    pub conversation_id: Option<String>,
}

/// Reply to a conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub response: String,
    /// Labels for whatever the assistant did on the user's behalf.
    /// The backend sends `null` or omits the field when nothing happened.
    #[serde(default)]
    pub actions_taken: Option<Vec<String>>,
}

impl ChatResponse {
    pub fn actions(&self) -> &[String] {
        self.actions_taken.as_deref().unwrap_or_default()
    }
}

/// HTTP client for the task assistant's conversation endpoint
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    user_id: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint_url()?;

        // No request timeout: a slow backend keeps the view loading until the
        // network layer itself gives up.
        let client = reqwest::Client::builder()
            .user_agent(concat!("taskchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            user_id: config.user_id.clone(),
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Build the request body for one user turn
    pub fn request_for(&self, message: String, conversation_id: Option<String>) -> ChatRequest {
        ChatRequest {
            message,
            user_id: self.user_id.clone(),
            conversation_id,
        }
    }

    /// Send one turn and decode the reply
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            conversation_id = request.conversation_id.as_deref().unwrap_or("<new>"),
            message_len = request.message.len(),
            "sending conversation turn"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let reply: ChatResponse = response.json().await?;
        Ok(reply)
    }
}

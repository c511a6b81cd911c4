//! Error types for the conversation API client
use thiserror::Error;

/// Failure of a single conversation turn.
///
/// Network errors, non-2xx statuses and undecodable bodies all land here
/// without further distinction; the chat view treats every one of them the
/// same way.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Conversation request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

//! Conversation UI components for the chat interface

pub mod composer;
pub mod history;
pub mod indicator;
pub mod manager;

pub use history::ConversationHistory;
pub use indicator::WorkingIndicator;
pub use manager::{ChatView, ConversationAction};

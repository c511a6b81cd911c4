use crate::api::ChatResponse;
use chrono::{DateTime, Utc};

/// Everything that can change the chat session.
///
/// Events are applied by [`crate::session::reduce`]; the `at` timestamps are
/// supplied by the caller so the reducer stays pure.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Insert a character at the cursor
    Insert(char),

    /// Insert pasted text at the cursor
    Paste(String),

    /// Delete the character before the cursor
    Backspace,

    /// Delete the character under the cursor
    Delete,

    /// Move the cursor
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,

    /// Send `text` as the next user turn
    Submit { text: String, at: DateTime<Utc> },

    /// The in-flight request returned a reply
    ResponseReceived {
        response: ChatResponse,
        at: DateTime<Utc>,
    },

    /// The in-flight request failed, for any reason
    RequestFailed { reason: String, at: DateTime<Utc> },
}

impl SessionEvent {
    /// Whether this event settles the in-flight request
    pub fn is_settlement(&self) -> bool {
        matches!(
            self,
            SessionEvent::ResponseReceived { .. } | SessionEvent::RequestFailed { .. }
        )
    }
}

/// Side effects requested by the reducer, carried out by the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue one request to the conversation API
    SendMessage {
        message: String,
        conversation_id: Option<String>,
    },
}

/// TUI-specific events (keyboard, paste, resize, animation)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Bracketed paste
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Animation tick
    Tick,
}

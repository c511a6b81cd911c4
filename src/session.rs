//! Chat session state and the reducer that drives it

use crate::events::{Effect, SessionEvent};
use chrono::{DateTime, Utc};
use strum::Display;

/// Shown in place of a reply when a turn fails
pub const REQUEST_FAILED_MESSAGE: &str = "Sorry, there was an error processing your request.";

/// Who wrote a message. `Display` gives the label shown above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Role {
    #[strum(to_string = "You")]
    User,
    Assistant,
}

/// A single exchanged message. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Actions the backend reports having taken; empty when none
    pub actions: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: String, sent_at: DateTime<Utc>) -> Self {
        Self {
            role: Role::User,
            content,
            actions: Vec::new(),
            sent_at,
        }
    }

    pub fn assistant(content: String, actions: Vec<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            actions,
            sent_at,
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe editing
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// The text being composed, with a cursor measured in characters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn insert_str(&mut self, s: &str) {
        let at = char_to_byte_index(&self.text, self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = char_to_byte_index(&self.text, self.cursor);
        self.text.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(at);
        }
    }

    fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

/// Everything the chat view knows about the conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub pending_input: InputBuffer,
    pub is_loading: bool,
    /// Issued by the backend on the first successful turn, then fixed
    pub conversation_id: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Apply one event, returning the next state and any request to issue.
pub fn reduce(mut state: SessionState, event: SessionEvent) -> (SessionState, Option<Effect>) {
    match event {
        SessionEvent::Submit { text, at } => {
            if state.is_loading || text.trim().is_empty() {
                return (state, None);
            }

            state.messages.push(Message::user(text.clone(), at));
            state.pending_input.clear();
            state.is_loading = true;

            let effect = Effect::SendMessage {
                message: text,
                conversation_id: state.conversation_id.clone(),
            };
            (state, Some(effect))
        }

        SessionEvent::ResponseReceived { response, at } => {
            if !state.is_loading {
                return (state, None);
            }

            if state.conversation_id.is_none() {
                state.conversation_id = Some(response.conversation_id);
            }
            let actions = response.actions_taken.unwrap_or_default();
            state
                .messages
                .push(Message::assistant(response.response, actions, at));
            state.is_loading = false;
            (state, None)
        }

        SessionEvent::RequestFailed { at, .. } => {
            if !state.is_loading {
                return (state, None);
            }

            state.messages.push(Message::assistant(
                REQUEST_FAILED_MESSAGE.to_string(),
                Vec::new(),
                at,
            ));
            state.is_loading = false;
            (state, None)
        }

        // The input is disabled while a request is in flight.
        _ if state.is_loading => (state, None),

        SessionEvent::Insert(c) => {
            let mut buf = [0u8; 4];
            state.pending_input.insert_str(c.encode_utf8(&mut buf));
            (state, None)
        }
        SessionEvent::Paste(text) => {
            state.pending_input.insert_str(&text);
            (state, None)
        }
        SessionEvent::Backspace => {
            state.pending_input.backspace();
            (state, None)
        }
        SessionEvent::Delete => {
            state.pending_input.delete();
            (state, None)
        }
        SessionEvent::CursorLeft => {
            state.pending_input.cursor = state.pending_input.cursor.saturating_sub(1);
            (state, None)
        }
        SessionEvent::CursorRight => {
            let len = state.pending_input.char_len();
            state.pending_input.cursor = (state.pending_input.cursor + 1).min(len);
            (state, None)
        }
        SessionEvent::CursorHome => {
            state.pending_input.cursor = 0;
            (state, None)
        }
        SessionEvent::CursorEnd => {
            state.pending_input.cursor = state.pending_input.char_len();
            (state, None)
        }
    }
}

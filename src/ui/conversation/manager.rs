use crate::api::ApiClient;
use crate::config::UiConfig;
use crate::events::{Effect, SessionEvent};
use crate::session::{SessionState, reduce};
use crate::ui::conversation::composer::{self, ComposerAction, ConversationComposer};
use crate::ui::conversation::{ConversationHistory, WorkingIndicator};
use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use tokio::sync::mpsc;

/// Actions that can be requested by the chat view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Reports the outcome of one request back to the view.
///
/// Exactly one settlement event is delivered per request: either the one
/// passed to [`Settlement::complete`], or a failure sent from `Drop` when the
/// request task ends any other way.
struct Settlement {
    tx: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Settlement {
    fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    fn complete(mut self, event: SessionEvent) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(event);
        }
    }
}

impl Drop for Settlement {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            tracing::warn!("request task ended without settling");
            let _ = tx.send(SessionEvent::RequestFailed {
                reason: "request task ended without a result".to_string(),
                at: Utc::now(),
            });
        }
    }
}

/// The chat session view: owns the session state, applies events through the
/// reducer and runs the requests it asks for
pub struct ChatView {
    state: SessionState,
    client: ApiClient,
    settle_tx: mpsc::UnboundedSender<SessionEvent>,
    scroll_offset: usize,
    max_scroll: usize,
    page_size: usize,
    tick: usize,
    show_timestamps: bool,
}

impl ChatView {
    /// Request outcomes are delivered on `settle_tx`; the event loop feeds them
    /// back through [`ChatView::dispatch`].
    pub fn new(
        client: ApiClient,
        settle_tx: mpsc::UnboundedSender<SessionEvent>,
        ui: &UiConfig,
    ) -> Self {
        Self {
            state: SessionState::new(),
            client,
            settle_tx,
            scroll_offset: 0,
            max_scroll: 0,
            page_size: 10,
            tick: 0,
            show_timestamps: ui.show_timestamps,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one event and carry out whatever effect it produces
    pub fn dispatch(&mut self, event: SessionEvent) {
        let settles = event.is_settlement();
        let was_loading = self.state.is_loading;
        let before = self.state.messages.len();

        if settles && !was_loading {
            match &event {
                SessionEvent::RequestFailed { reason, .. } => {
                    tracing::debug!(%reason, "ignoring failure with no request in flight");
                }
                _ => tracing::debug!("ignoring reply with no request in flight"),
            }
        }

        let state = std::mem::take(&mut self.state);
        let (state, effect) = reduce(state, event);
        self.state = state;

        if self.state.messages.len() != before {
            self.scroll_offset = 0;
        }
        if settles && was_loading {
            tracing::debug!(messages = self.state.messages.len(), "request settled");
        }

        if let Some(effect) = effect {
            self.run(effect);
        }
    }

    /// Submit `text` as the next user turn
    pub fn submit(&mut self, text: String) {
        self.dispatch(SessionEvent::Submit {
            text,
            at: Utc::now(),
        });
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> ConversationAction {
        match composer::handle_key(key) {
            ComposerAction::Submit => {
                let text = self.state.pending_input.text().to_string();
                self.submit(text);
            }
            ComposerAction::Edit(event) => self.dispatch(event),
            ComposerAction::ScrollUp => {
                self.scroll_offset = (self.scroll_offset + self.page_size).min(self.max_scroll);
            }
            ComposerAction::ScrollDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.page_size);
            }
            ComposerAction::Exit => return ConversationAction::Exit,
            ComposerAction::None => {}
        }
        ConversationAction::None
    }

    pub fn handle_paste(&mut self, text: String) {
        self.dispatch(SessionEvent::Paste(text));
    }

    /// Advance the working indicator animation
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    fn run(&self, effect: Effect) {
        match effect {
            Effect::SendMessage {
                message,
                conversation_id,
            } => self.spawn_request(message, conversation_id),
        }
    }

    fn spawn_request(&self, message: String, conversation_id: Option<String>) {
        let client = self.client.clone();
        let settlement = Settlement::new(self.settle_tx.clone());
        let request = client.request_for(message, conversation_id);

        tracing::info!(
            conversation_id = request.conversation_id.as_deref().unwrap_or("<new>"),
            message_len = request.message.len(),
            "sending message"
        );

        tokio::spawn(async move {
            let event = match client.send(&request).await {
                Ok(response) => {
                    tracing::info!(
                        conversation_id = %response.conversation_id,
                        actions = response.actions().len(),
                        "assistant replied"
                    );
                    SessionEvent::ResponseReceived {
                        response,
                        at: Utc::now(),
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "conversation turn failed");
                    SessionEvent::RequestFailed {
                        reason: err.to_string(),
                        at: Utc::now(),
                    }
                }
            };
            settlement.complete(event);
        });
    }

    /// Render the chat view: history on top, composer at the bottom
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(ConversationComposer::height(&self.state.pending_input)),
            ])
            .split(area);

        let working = self
            .state
            .is_loading
            .then(|| WorkingIndicator::new(self.tick));
        let history = ConversationHistory::new(&self.state.messages)
            .working(working)
            .show_timestamps(self.show_timestamps);

        self.max_scroll = history.max_scroll(chunks[0]);
        self.page_size = (chunks[0].height.saturating_sub(2) as usize).max(1);
        self.scroll_offset = self.scroll_offset.min(self.max_scroll);

        history.scroll_offset(self.scroll_offset).render(chunks[0], buf);

        ConversationComposer::new(&self.state.pending_input)
            .disabled(self.state.is_loading)
            .render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatResponse;
    use crate::api::test_server::{self, Reply};
    use crate::config::Config;
    use crate::session::{REQUEST_FAILED_MESSAGE, Role};
    use axum::http::StatusCode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn view_for(url: &str) -> (ChatView, mpsc::UnboundedReceiver<SessionEvent>) {
        let config = Config {
            endpoint: url.to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (ChatView::new(client, tx, &config.ui), rx)
    }

    fn type_text(view: &mut ChatView, text: &str) {
        for c in text.chars() {
            view.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn press_enter(view: &mut ChatView) {
        view.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    }

    /// Wait for the in-flight request and apply its outcome
    async fn settle(view: &mut ChatView, rx: &mut mpsc::UnboundedReceiver<SessionEvent>) {
        let event = rx.recv().await.unwrap();
        assert!(event.is_settlement());
        view.dispatch(event);
    }

    #[tokio::test]
    async fn test_full_turn_with_actions() {
        let server = test_server::spawn(vec![test_server::reply(
            "c1",
            "Added!",
            &["created task: buy groceries"],
        )])
        .await;
        let (mut view, mut rx) = view_for(&server.url());

        type_text(&mut view, "Create a task to buy groceries");
        press_enter(&mut view);

        assert_eq!(view.state().messages.len(), 1);
        assert!(view.state().is_loading);
        assert!(view.state().pending_input.is_empty());

        settle(&mut view, &mut rx).await;

        let state = view.state();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].role, Role::Assistant);
        assert_eq!(state.messages[1].content, "Added!");
        assert_eq!(state.messages[1].actions, vec!["created task: buy groceries".to_string()]);
        assert_eq!(state.conversation_id.as_deref(), Some("c1"));
        assert!(!state.is_loading);

        let seen = server.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "Create a task to buy groceries");
        assert_eq!(seen[0].user_id, "demo-user");
    }

    #[tokio::test]
    async fn test_network_failure_shows_error_and_clears_loading() {
        let (mut view, mut rx) = view_for(&test_server::closed_url().await);

        view.submit("hello".to_string());
        assert!(view.state().is_loading);
        settle(&mut view, &mut rx).await;

        let state = view.state();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[1].content, REQUEST_FAILED_MESSAGE);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_server_error_then_recovery() {
        let server = test_server::spawn(vec![
            Reply::Status(StatusCode::INTERNAL_SERVER_ERROR),
            test_server::reply("c9", "Back online", &[]),
        ])
        .await;
        let (mut view, mut rx) = view_for(&server.url());

        view.submit("first".to_string());
        settle(&mut view, &mut rx).await;
        assert_eq!(view.state().messages[1].content, REQUEST_FAILED_MESSAGE);

        view.submit("second".to_string());
        settle(&mut view, &mut rx).await;
        assert_eq!(view.state().messages.len(), 4);
        assert_eq!(view.state().messages[3].content, "Back online");
        assert_eq!(view.state().conversation_id.as_deref(), Some("c9"));
    }

    #[tokio::test]
    async fn test_conversation_id_sent_and_not_overwritten() {
        let server = test_server::spawn(vec![
            test_server::reply("abc", "one", &[]),
            test_server::reply("xyz", "two", &[]),
        ])
        .await;
        let (mut view, mut rx) = view_for(&server.url());

        view.submit("first".to_string());
        settle(&mut view, &mut rx).await;
        view.submit("second".to_string());
        settle(&mut view, &mut rx).await;

        assert_eq!(view.state().conversation_id.as_deref(), Some("abc"));

        let seen = server.requests();
        assert_eq!(seen[0].conversation_id, None);
        assert_eq!(seen[1].conversation_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_only_one_request_in_flight() {
        let server = test_server::spawn(vec![test_server::reply("c1", "ok", &[])]).await;
        let (mut view, mut rx) = view_for(&server.url());

        view.submit("first".to_string());
        view.submit("second".to_string());
        type_text(&mut view, "ignored");
        press_enter(&mut view);
        assert_eq!(view.state().messages.len(), 1);

        settle(&mut view, &mut rx).await;
        assert_eq!(view.state().messages.len(), 2);
        assert!(rx.try_recv().is_err());
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_enter_sends_nothing() {
        let (mut view, mut rx) = view_for(&test_server::closed_url().await);

        type_text(&mut view, "   ");
        press_enter(&mut view);

        assert!(view.state().messages.is_empty());
        assert!(!view.state().is_loading);
        assert_eq!(view.state().pending_input.text(), "   ");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_settlement_reports_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(Settlement::new(tx));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::RequestFailed { .. }));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_completed_settlement_sends_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        Settlement::new(tx).complete(SessionEvent::RequestFailed {
            reason: "boom".to_string(),
            at: Utc::now(),
        });

        assert!(matches!(
            rx.recv().await,
            Some(SessionEvent::RequestFailed { reason, .. }) if reason == "boom"
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_panicking_request_task_still_settles() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let settlement = Settlement::new(tx);
        let task = tokio::spawn(async move {
            let _settlement = settlement;
            panic!("request task blew up");
        });

        assert!(task.await.unwrap_err().is_panic());
        assert!(matches!(rx.recv().await, Some(SessionEvent::RequestFailed { .. })));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stray_settlement_leaves_view_unchanged() {
        let (mut view, _rx) = view_for(&test_server::closed_url().await);
        type_text(&mut view, "draft");
        let before = view.state().clone();

        view.dispatch(SessionEvent::RequestFailed {
            reason: "late".to_string(),
            at: Utc::now(),
        });
        view.dispatch(SessionEvent::ResponseReceived {
            response: ChatResponse {
                conversation_id: "c1".to_string(),
                response: "late reply".to_string(),
                actions_taken: None,
            },
            at: Utc::now(),
        });

        assert_eq!(view.state(), &before);
    }

    #[tokio::test]
    async fn test_escape_exits() {
        let (mut view, _rx) = view_for(&test_server::closed_url().await);
        assert_eq!(
            view.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            ConversationAction::Exit
        );
    }

    #[tokio::test]
    async fn test_render_shows_indicator_only_while_loading() {
        let server = test_server::spawn(vec![test_server::reply("c1", "done", &[])]).await;
        let (mut view, mut rx) = view_for(&server.url());
        let area = Rect::new(0, 0, 50, 20);
        let screen = |view: &mut ChatView| -> String {
            let mut buf = Buffer::empty(area);
            view.render(area, &mut buf);
            (0..area.height)
                .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol()).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n")
        };

        view.submit("hello".to_string());
        assert!(screen(&mut view).contains("Working"));

        settle(&mut view, &mut rx).await;
        let text = screen(&mut view);
        assert!(!text.contains("Working"));
        assert!(text.contains("done"));
    }
}

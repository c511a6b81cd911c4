use crate::api::ApiClient;
use crate::config::Config;
use crate::events::{SessionEvent, TuiEvent};
use crate::tui::{self, EventHandler, Tui};
use crate::ui::conversation::{ChatView, ConversationAction};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;

/// Run the interactive chat until the user quits
pub async fn run(config: Config) -> Result<()> {
    let client = ApiClient::new(&config)?;
    tracing::info!(endpoint = %client.endpoint(), user_id = client.user_id(), "starting chat");

    let (settle_tx, settle_rx) = mpsc::unbounded_channel();
    let view = ChatView::new(client, settle_tx, &config.ui);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let events = EventHandler::new(Duration::from_millis(config.ui.tick_rate_ms));

    let result = event_loop(&mut terminal, view, events, settle_rx).await;

    tui::restore()?;
    tracing::info!("chat closed");
    result
}

async fn event_loop(
    terminal: &mut Tui,
    mut view: ChatView,
    mut events: EventHandler,
    mut settle_rx: mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| {
                let area = frame.size();
                view.render(area, frame.buffer_mut());
            })
            .context("Failed to draw frame")?;

        tokio::select! {
            event = events.next() => match event {
                Some(TuiEvent::Key(key)) => {
                    if view.handle_key(key) == ConversationAction::Exit {
                        return Ok(());
                    }
                }
                Some(TuiEvent::Paste(text)) => view.handle_paste(text),
                Some(TuiEvent::Tick) => view.tick(),
                Some(TuiEvent::Resize(width, height)) => {
                    tracing::debug!(width, height, "terminal resized");
                }
                None => return Ok(()),
            },
            Some(settled) = settle_rx.recv() => view.dispatch(settled),
        }
    }
}

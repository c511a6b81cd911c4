use crate::events::SessionEvent;
use crate::session::InputBuffer;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Most input lines shown before the composer stops growing
const MAX_VISIBLE_LINES: u16 = 5;

/// What a key press asks the chat view to do
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerAction {
    /// Edit the pending input
    Edit(SessionEvent),
    /// Submit the pending input
    Submit,
    ScrollUp,
    ScrollDown,
    Exit,
    None,
}

/// Map a key press onto a composer action
pub fn handle_key(key: KeyEvent) -> ComposerAction {
    if key.kind != KeyEventKind::Press {
        return ComposerAction::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => ComposerAction::Exit,
            _ => ComposerAction::None,
        };
    }

    match key.code {
        KeyCode::Enter => {
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                ComposerAction::Edit(SessionEvent::Insert('\n'))
            } else {
                ComposerAction::Submit
            }
        }
        KeyCode::Char(c) => ComposerAction::Edit(SessionEvent::Insert(c)),
        KeyCode::Backspace => ComposerAction::Edit(SessionEvent::Backspace),
        KeyCode::Delete => ComposerAction::Edit(SessionEvent::Delete),
        KeyCode::Left => ComposerAction::Edit(SessionEvent::CursorLeft),
        KeyCode::Right => ComposerAction::Edit(SessionEvent::CursorRight),
        KeyCode::Home => ComposerAction::Edit(SessionEvent::CursorHome),
        KeyCode::End => ComposerAction::Edit(SessionEvent::CursorEnd),
        KeyCode::PageUp | KeyCode::Up => ComposerAction::ScrollUp,
        KeyCode::PageDown | KeyCode::Down => ComposerAction::ScrollDown,
        KeyCode::Esc => ComposerAction::Exit,
        _ => ComposerAction::None,
    }
}

/// Conversation composer for user input
pub struct ConversationComposer<'a> {
    input: &'a InputBuffer,
    placeholder: &'a str,
    disabled: bool,
}

impl<'a> ConversationComposer<'a> {
    pub fn new(input: &'a InputBuffer) -> Self {
        Self {
            input,
            placeholder: "Type your message...",
            disabled: false,
        }
    }

    /// A disabled composer ignores input and says so
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Rows needed to draw the composer, borders included
    pub fn height(input: &InputBuffer) -> u16 {
        let lines = input.text().split('\n').count() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + 2
    }

    fn title(&self) -> &'static str {
        if self.disabled {
            " ⏳ Waiting for the assistant... "
        } else {
            " ✏️  Message · Enter to send "
        }
    }
}

impl Widget for ConversationComposer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(if self.disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Cyan)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.input.is_empty() {
            let placeholder_line = Line::from(Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            return;
        }

        // Content with cursor indicator
        let mut content = self.input.text().to_string();
        if !self.disabled {
            let at = content
                .char_indices()
                .nth(self.input.cursor())
                .map(|(i, _)| i)
                .unwrap_or(content.len());
            content.insert(at, '▌');
        }

        // Keep the end of long input visible
        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner_area.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, line_text) in lines[start..].iter().enumerate() {
            let line = Line::from(Span::styled(*line_text, Style::default().fg(Color::White)));
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionState, reduce};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_enter_submits_without_modifier() {
        assert_eq!(
            handle_key(key(KeyCode::Enter, KeyModifiers::NONE)),
            ComposerAction::Submit
        );
        assert_eq!(
            handle_key(key(KeyCode::Enter, KeyModifiers::SHIFT)),
            ComposerAction::Edit(SessionEvent::Insert('\n'))
        );
        assert_eq!(
            handle_key(key(KeyCode::Enter, KeyModifiers::ALT)),
            ComposerAction::Edit(SessionEvent::Insert('\n'))
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(handle_key(key(KeyCode::Esc, KeyModifiers::NONE)), ComposerAction::Exit);
        assert_eq!(
            handle_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            ComposerAction::Exit
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            ComposerAction::None
        );
    }

    #[test]
    fn test_release_events_ignored() {
        let mut release = key(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_key(release), ComposerAction::None);
    }

    #[test]
    fn test_height_grows_with_lines() {
        let state = SessionState::new();
        assert_eq!(ConversationComposer::height(&state.pending_input), 3);

        let (state, _) = reduce(state, SessionEvent::Paste("a\nb\nc".to_string()));
        assert_eq!(ConversationComposer::height(&state.pending_input), 5);

        let (state, _) = reduce(state, SessionEvent::Paste("\n".repeat(20)));
        assert_eq!(ConversationComposer::height(&state.pending_input), MAX_VISIBLE_LINES + 2);
    }

    #[test]
    fn test_renders_placeholder_then_text() {
        let area = Rect::new(0, 0, 40, 3);
        let row = |buf: &Buffer| -> String { (0..40).map(|x| buf.get(x, 1).symbol()).collect() };

        let state = SessionState::new();
        let mut buf = Buffer::empty(area);
        ConversationComposer::new(&state.pending_input).render(area, &mut buf);
        assert!(row(&buf).contains("Type your message..."));

        let (state, _) = reduce(state, SessionEvent::Paste("buy milk".to_string()));
        let mut buf = Buffer::empty(area);
        ConversationComposer::new(&state.pending_input).render(area, &mut buf);
        assert!(row(&buf).contains("buy milk▌"));
    }
}

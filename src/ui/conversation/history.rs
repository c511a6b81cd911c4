//! Conversation history display component

use crate::session::{Message, Role};
use crate::ui::conversation::indicator::WorkingIndicator;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// A laid-out line and the column it starts at, relative to the inner area
type Placed = (u16, Line<'static>);

/// Conversation history display component
pub struct ConversationHistory<'a> {
    messages: &'a [Message],
    working: Option<WorkingIndicator>,
    scroll_offset: usize,
    show_timestamps: bool,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            working: None,
            scroll_offset: 0,
            show_timestamps: true,
        }
    }

    /// Show the working indicator after the last message
    pub fn working(mut self, indicator: Option<WorkingIndicator>) -> Self {
        self.working = indicator;
        self
    }

    /// Lines scrolled up from the bottom
    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    fn block() -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(
                " 🤖 AI Task Assistant ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
    }

    /// Largest useful scroll offset for a history drawn into `area`
    pub fn max_scroll(&self, area: Rect) -> usize {
        let inner = Self::block().inner(area);
        let total = self.layout(inner.width).len();
        total.saturating_sub(inner.height as usize)
    }

    /// Lay out every message (and the indicator) for the given inner width
    fn layout(&self, width: u16) -> Vec<Placed> {
        let mut placed = Vec::new();
        for message in self.messages {
            placed.extend(self.layout_message(message, width));
            placed.push((0, Line::default()));
        }

        if let Some(indicator) = self.working {
            placed.push((0, indicator.line()));
        }

        placed
    }

    fn layout_message(&self, message: &Message, width: u16) -> Vec<Placed> {
        // Bubbles take at most 80% of the row.
        let bubble_width = ((width as usize) * 4 / 5).max(1);

        let mut lines: Vec<Line<'static>> = Vec::new();
        lines.push(self.header(message));

        let content_style = match message.role {
            Role::User => Style::default().fg(Color::Cyan),
            Role::Assistant => Style::default().fg(Color::White),
        };
        for content_line in wrap_text(&message.content, bubble_width) {
            lines.push(Line::from(Span::styled(content_line, content_style)));
        }

        if !message.actions.is_empty() {
            lines.push(Line::from(Span::styled(
                "Actions taken:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            for action in &message.actions {
                for (i, action_line) in wrap_text(action, bubble_width.saturating_sub(2).max(1))
                    .into_iter()
                    .enumerate()
                {
                    let marker = if i == 0 { "✓ " } else { "  " };
                    lines.push(Line::from(vec![
                        Span::styled(marker, Style::default().fg(Color::Green)),
                        Span::styled(action_line, Style::default().fg(Color::Gray)),
                    ]));
                }
            }
        }

        // User messages sit against the right edge as one block.
        let indent = match message.role {
            Role::User => {
                let block_width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
                width.saturating_sub(block_width)
            }
            Role::Assistant => 0,
        };

        lines.into_iter().map(|line| (indent, line)).collect()
    }

    fn header(&self, message: &Message) -> Line<'static> {
        let label = if self.show_timestamps {
            format!("{} · {}", message.role, message.sent_at.format("%H:%M:%S"))
        } else {
            message.role.to_string()
        };

        Line::from(Span::styled(label, Style::default().fg(Color::DarkGray)))
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Self::block();
        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && self.working.is_none() {
            render_welcome(inner_area, buf);
            return;
        }

        let placed = self.layout(inner_area.width);

        // Show the window ending `scroll_offset` lines above the bottom
        let height = inner_area.height as usize;
        let total = placed.len();
        let offset = self.scroll_offset.min(total.saturating_sub(height));
        let end = total - offset;
        let start = end.saturating_sub(height);

        for (row, (indent, line)) in placed[start..end].iter().enumerate() {
            let x = inner_area.x + (*indent).min(inner_area.width);
            let width = inner_area.width.saturating_sub(*indent);
            buf.set_line(x, inner_area.y + row as u16, line, width);
        }
    }
}

fn render_welcome(area: Rect, buf: &mut Buffer) {
    let hint = Style::default().fg(Color::Cyan);
    let welcome_lines = vec![
        Line::from(Span::styled(
            "Welcome to AI Task Assistant",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Your intelligent task management companion",
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled("Try saying:", Style::default().fg(Color::Gray))),
        Line::from(Span::styled("\"Create a task to buy groceries\"", hint)),
        Line::from(Span::styled("\"Show me my tasks\"", hint)),
        Line::from(Span::styled("\"Mark task as complete\"", hint)),
        Line::default(),
        Line::from(Span::styled(
            "Enter to send · Shift+Enter for a new line · Esc to quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let top = area.y + area.height.saturating_sub(welcome_lines.len() as u16) / 2;
    for (i, line) in welcome_lines.iter().enumerate() {
        let y = top + i as u16;
        if y >= area.y + area.height {
            break;
        }
        let indent = area.width.saturating_sub(line.width() as u16) / 2;
        buf.set_line(area.x + indent, y, line, area.width - indent);
    }
}

/// Split `s` after at most `width` display columns. Always takes at least one
/// character so a glyph wider than `width` still makes progress.
fn split_at_width(s: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width && i > 0 {
            return s.split_at(i);
        }
        used += w;
    }
    (s, "")
}

/// Wrap text to fit within `width` display columns, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph_start = lines.len();
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word;

            // Hard-split words that can never fit
            while word.width() > width {
                if !current_line.is_empty() {
                    lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                }
                let (head, rest) = split_at_width(word, width);
                lines.push(head.to_string());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }

            let word_width = word.width();
            let needed = if current_line.is_empty() { word_width } else { word_width + 1 };
            if current_width + needed > width && !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if !current_line.is_empty() {
                current_line.push(' ');
                current_width += 1;
            }
            current_width += word_width;
            current_line.push_str(word);
        }

        if !current_line.is_empty() || lines.len() == paragraph_start {
            lines.push(current_line);
        }
    }

    lines
}

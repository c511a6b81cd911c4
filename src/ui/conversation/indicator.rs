use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Animated "working" line shown while a request is in flight
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkingIndicator {
    frame: usize,
}

impl WorkingIndicator {
    pub fn new(frame: usize) -> Self {
        Self { frame }
    }

    pub fn line(&self) -> Line<'static> {
        let spinner = FRAMES[self.frame % FRAMES.len()];
        let dots = match self.frame % 4 {
            0 => "",
            1 => ".",
            2 => "..",
            _ => "...",
        };

        Line::from(vec![
            Span::styled(format!("{spinner} "), Style::default().fg(Color::Cyan)),
            Span::styled("Working", Style::default().fg(Color::Cyan)),
            Span::styled(dots, Style::default().fg(Color::Yellow)),
        ])
    }
}

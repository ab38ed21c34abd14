//! Status bar: the last command feedback, cleared after a few seconds.

use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tracing::{error, info, warn};

use kerminal_core::{Level, ResultSink};

use crate::theme;

const RESET_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct StatusBar {
    message: Option<(Level, String, Instant)>,
}

impl StatusBar {
    /// Drop the message once it has been shown long enough.
    pub fn expire(&mut self, now: Instant) {
        if let Some((_, _, shown)) = &self.message {
            if now.duration_since(*shown) >= RESET_AFTER {
                self.message = None;
            }
        }
    }

    pub fn current(&self) -> Option<(Level, &str)> {
        self.message
            .as_ref()
            .map(|(level, message, _)| (*level, message.as_str()))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = match self.current() {
            Some((level, message)) => Line::from(vec![
                Span::styled(format!("{}:", prefix(level)), theme::level(level)),
                Span::raw(" "),
                Span::styled(message.to_owned(), theme::label()),
            ]),
            None => Line::from(vec![
                Span::styled("Status:", theme::key_hint()),
                Span::raw(" "),
                Span::styled("help", theme::key_hint_key()),
                Span::styled(" lists commands", theme::key_hint()),
            ]),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn prefix(level: Level) -> &'static str {
    match level {
        Level::Info => "INFO",
        Level::Warning => "WARNING",
        Level::Error => "ERROR",
        Level::Critical => "CRITICAL",
    }
}

impl ResultSink for StatusBar {
    fn report(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => info!(message, "status"),
            Level::Warning => warn!(message, "status"),
            Level::Error | Level::Critical => error!(%level, message, "status"),
        }
        self.message = Some((level, message.to_owned(), Instant::now()));
    }
}

//! Text view: help, haiku, log status and anything else a command prints.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Text;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const WELCOME: &str = "\
Welcome to Kerminal!

Connect to a Telemachus server with \"connect <host-address> [<port>]\".
Type \"help\" for the list of commands.";

#[derive(Debug)]
pub struct TextScreen {
    text: String,
    scroll: u16,
}

impl TextScreen {
    pub fn new() -> Self {
        Self {
            text: WELCOME.to_owned(),
            scroll: 0,
        }
    }

    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn max_scroll(&self) -> u16 {
        u16::try_from(self.text.lines().count().saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

impl Default for TextScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for TextScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::PageUp => Some(Action::ScrollUp),
            KeyCode::PageDown => Some(Action::ScrollDown),
            _ => None,
        }
    }

    fn update(&mut self, action: &Action) {
        match action {
            Action::ShowText(text) => {
                self.text.clone_from(text);
                self.scroll = 0;
            }
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(5),
            Action::ScrollDown => self.scroll = self.scroll.saturating_add(5).min(self.max_scroll()),
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Kerminal ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let paragraph = Paragraph::new(Text::styled(self.text.as_str(), theme::label()))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn id(&self) -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_text_resets_scroll() {
        let mut screen = TextScreen::new();
        screen.update(&Action::ShowText("a\nb\nc\nd\ne\nf\ng\nh".into()));
        screen.update(&Action::ScrollDown);
        assert_eq!(screen.scroll, 5);
        screen.update(&Action::ScrollDown);
        assert_eq!(screen.scroll, 7);

        screen.update(&Action::ShowText("short".into()));
        assert_eq!(screen.scroll, 0);
        assert_eq!(screen.text(), "short");
    }
}

//! Editable command line with Up/Down history.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::{Input, InputRequest};

use crate::theme;

const PROMPT: &str = "> ";
const HISTORY_LIMIT: usize = 200;

#[derive(Debug, Default)]
pub struct CommandLine {
    input: Input,
    history: Vec<String>,
    /// Position while browsing history; `None` when editing a fresh line.
    browsing: Option<usize>,
    /// The unfinished line stashed when browsing starts.
    draft: String,
}

impl CommandLine {
    /// Returns the submitted line on Enter.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<String> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request = match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Up => {
                self.previous();
                return None;
            }
            KeyCode::Down => {
                self.next();
                return None;
            }
            KeyCode::Esc => {
                self.input.reset();
                self.browsing = None;
                return None;
            }
            KeyCode::Char('u') if ctrl => InputRequest::DeleteLine,
            KeyCode::Char('w') if ctrl => InputRequest::DeletePrevWord,
            KeyCode::Char('a') if ctrl => InputRequest::GoToStart,
            KeyCode::Char('e') if ctrl => InputRequest::GoToEnd,
            KeyCode::Char(c) if !ctrl => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left if ctrl => InputRequest::GoToPrevWord,
            KeyCode::Right if ctrl => InputRequest::GoToNextWord,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return None,
        };
        self.input.handle(request);
        None
    }

    /// Insert pasted text at the cursor. Newlines become spaces.
    pub fn paste(&mut self, text: &str) {
        for c in text.chars() {
            let c = if c == '\n' || c == '\r' { ' ' } else { c };
            self.input.handle(InputRequest::InsertChar(c));
        }
    }

    #[cfg(test)]
    pub fn value(&self) -> &str {
        self.input.value()
    }

    fn submit(&mut self) -> Option<String> {
        let line = self.input.value().trim().to_owned();
        self.input.reset();
        self.browsing = None;
        if line.is_empty() {
            return None;
        }
        if self.history.last() != Some(&line) {
            self.history.push(line.clone());
            if self.history.len() > HISTORY_LIMIT {
                self.history.remove(0);
            }
        }
        Some(line)
    }

    fn previous(&mut self) {
        let index = match self.browsing {
            None if self.history.is_empty() => return,
            None => {
                self.draft = self.input.value().to_owned();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.show(index);
    }

    fn next(&mut self) {
        match self.browsing {
            None => {}
            Some(i) if i + 1 < self.history.len() => self.show(i + 1),
            Some(_) => {
                self.browsing = None;
                self.input = Input::new(std::mem::take(&mut self.draft));
            }
        }
    }

    fn show(&mut self, index: usize) {
        if let Some(line) = self.history.get(index) {
            self.input = Input::new(line.clone());
            self.browsing = Some(index);
        }
    }

    /// One line: prompt then input, scrolled to keep the cursor visible.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let prompt_width = u16::try_from(PROMPT.len()).unwrap_or(u16::MAX);
        let width = usize::from(area.width.saturating_sub(prompt_width).max(1));
        let scroll = self.input.visual_scroll(width.saturating_sub(1));
        let visible: String = self.input.value().chars().skip(scroll).take(width).collect();

        let line = Line::from(vec![
            Span::styled(PROMPT, theme::key_hint_key()),
            Span::styled(visible, theme::label()),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let cursor = self.input.visual_cursor().saturating_sub(scroll);
        let x = area
            .x
            .saturating_add(prompt_width)
            .saturating_add(u16::try_from(cursor).unwrap_or(u16::MAX));
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn press(line: &mut CommandLine, code: KeyCode) -> Option<String> {
        line.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(line: &mut CommandLine, text: &str) {
        for c in text.chars() {
            press(line, KeyCode::Char(c));
        }
    }

    #[test]
    fn enter_submits_trimmed_line() {
        let mut line = CommandLine::default();
        type_text(&mut line, "  stage ");
        assert_eq!(press(&mut line, KeyCode::Enter).unwrap(), "stage");
        assert_eq!(line.value(), "");
        assert_eq!(press(&mut line, KeyCode::Enter), None);
    }

    #[test]
    fn history_walks_back_and_restores_draft() {
        let mut line = CommandLine::default();
        for command in ["connect localhost", "stage", "stage", "throttle 50"] {
            type_text(&mut line, command);
            press(&mut line, KeyCode::Enter);
        }
        type_text(&mut line, "ab");

        press(&mut line, KeyCode::Up);
        assert_eq!(line.value(), "throttle 50");
        press(&mut line, KeyCode::Up);
        assert_eq!(line.value(), "stage");
        press(&mut line, KeyCode::Up);
        assert_eq!(line.value(), "connect localhost");
        press(&mut line, KeyCode::Up);
        assert_eq!(line.value(), "connect localhost");

        press(&mut line, KeyCode::Down);
        press(&mut line, KeyCode::Down);
        assert_eq!(line.value(), "throttle 50");
        press(&mut line, KeyCode::Down);
        assert_eq!(line.value(), "ab");
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut line = CommandLine::default();
        line.paste("stage\nabort");
        assert_eq!(line.value(), "stage abort");
    }
}

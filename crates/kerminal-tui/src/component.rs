//! Component trait for the main-panel screens.

use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use kerminal_core::LiveDataStore;

use crate::action::Action;

/// A screen in the main panel.
///
/// Per poll tick: `feed` once, then `render` once. `feed` reads the store
/// and nothing else; `render` reads only what `feed` kept.
pub trait Component: Send {
    /// Variables that must stream while connected.
    fn variables(&self) -> Vec<String> {
        Vec::new()
    }

    fn feed(&mut self, _store: &LiveDataStore) {}

    /// Keys the command line does not consume (paging and the like).
    fn handle_key_event(&mut self, _key: KeyEvent) -> Option<Action> {
        None
    }

    /// Process a dispatched action.
    fn update(&mut self, _action: &Action) {}

    fn render(&self, frame: &mut Frame, area: Rect);

    fn id(&self) -> &str;
}

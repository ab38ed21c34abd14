//! Actions flowing through the app loop.

use kerminal_core::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A line entered on the command line.
    Submit(String),
    /// Run a core command against the session.
    Execute(Command),
    ShowText(String),
    /// Switch to the text view without changing its content.
    ShowLastText,
    ShowTelemetry,
    ScrollUp,
    ScrollDown,
    Quit,
}

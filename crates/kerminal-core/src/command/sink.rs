use std::fmt;

/// Severity of a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

/// Where command handlers send their feedback. The TUI status bar is
/// one; tests collect into a `Vec`.
pub trait ResultSink {
    fn report(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.report(Level::Info, message);
    }

    fn warning(&mut self, message: &str) {
        self.report(Level::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.report(Level::Error, message);
    }

    fn critical(&mut self, message: &str) {
        self.report(Level::Critical, message);
    }
}

impl ResultSink for Vec<(Level, String)> {
    fn report(&mut self, level: Level, message: &str) {
        self.push((level, message.to_owned()));
    }
}

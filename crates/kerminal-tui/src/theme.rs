//! Mission-control palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

use kerminal_core::Level;

// ── Core Palette ──────────────────────────────────────────────────────

pub const KERBAL_GREEN: Color = Color::Rgb(124, 252, 0); // #7cfc00
pub const CAPSULE_CYAN: Color = Color::Rgb(102, 217, 239); // #66d9ef
pub const AMBER: Color = Color::Rgb(255, 184, 76); // #ffb84c
pub const WARNING_ORANGE: Color = Color::Rgb(253, 151, 31); // #fd971f
pub const ERROR_RED: Color = Color::Rgb(255, 85, 85); // #ff5555
pub const CRITICAL_MAGENTA: Color = Color::Rgb(249, 38, 114); // #f92672

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(200, 200, 190); // #c8c8be
pub const BORDER_GRAY: Color = Color::Rgb(95, 105, 120); // #5f6978
pub const BG_PANEL: Color = Color::Rgb(28, 30, 36); // #1c1e24

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(CAPSULE_CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Top bar and command line header.
pub fn bar() -> Style {
    Style::default()
        .fg(BG_PANEL)
        .bg(CAPSULE_CYAN)
        .add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn value() -> Style {
    Style::default().fg(KERBAL_GREEN).add_modifier(Modifier::BOLD)
}

/// Values the store does not hold yet.
pub fn value_missing() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn connection(connected: bool) -> Style {
    if connected {
        Style::default().fg(BG_PANEL).bg(KERBAL_GREEN)
    } else {
        Style::default().fg(BG_PANEL).bg(AMBER)
    }
}

/// Status bar prefix for a feedback level.
pub fn level(level: Level) -> Style {
    let color = match level {
        Level::Info => CAPSULE_CYAN,
        Level::Warning => WARNING_ORANGE,
        Level::Error => ERROR_RED,
        Level::Critical => CRITICAL_MAGENTA,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Resource gauge fill: red below 20 %, amber below 50 %, green above.
pub fn gauge(ratio: f64) -> Style {
    let color = if ratio < 0.2 {
        ERROR_RED
    } else if ratio < 0.5 {
        AMBER
    } else {
        KERBAL_GREEN
    };
    Style::default().fg(color).bg(BG_PANEL)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(CAPSULE_CYAN).add_modifier(Modifier::BOLD)
}

//! Main-panel screens.

pub mod telemetry;
pub mod text;

use strum::Display;

/// Which screen the main panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ScreenId {
    Telemetry,
    Text,
}

// ── Command API ──
//
// Every user command arrives as a typed `Command`. Handlers run on the
// calling thread, talk to the server only through the session's queue,
// and report back through a `ResultSink`. Nothing here returns an error
// to the caller: failures become leveled feedback.

mod flight;
mod log;
pub mod sink;

use std::path::PathBuf;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use kerminal_api::protocol::DEFAULT_PORT;

use crate::datalog::FileMode;
use crate::error::CoreError;
use crate::session::Session;

pub use sink::{Level, ResultSink};

/// All operations a user can issue against the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Link ─────────────────────────────────────────────────────────
    Connect {
        address: String,
        port: Option<u16>,
    },
    Disconnect,

    // ── Flight ───────────────────────────────────────────────────────
    Abort,
    Stage,
    ActionGroup {
        group: u8,
    },
    Switch {
        system: Switch,
        on: bool,
    },
    FlyByWire(FlyByWire),
    Throttle(Throttle),
    Rate {
        interval_ms: f64,
    },
    SmartAss {
        mode: SmartAssMode,
        heading: Option<f64>,
        pitch: Option<f64>,
    },
    Send {
        payload: String,
    },

    // ── Data log ─────────────────────────────────────────────────────
    Log(LogCommand),
}

/// On/off vessel systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Switch {
    Brakes,
    Lights,
    Rcs,
    Sas,
    Gear,
}

impl Switch {
    pub(crate) fn action(self) -> &'static str {
        match self {
            Self::Brakes => "f.brake",
            Self::Lights => "f.light",
            Self::Rcs => "f.rcs",
            Self::Sas => "f.sas",
            Self::Gear => "f.gear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlyByWire {
    Enable(bool),
    Axes {
        yaw: Option<f64>,
        pitch: Option<f64>,
        roll: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throttle {
    Up,
    Down,
    /// Percentage of full throttle; clamped to 0..=100.
    Percent(f64),
}

/// MechJeb SmartASS attitude modes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SmartAssMode {
    Off,
    Node,
    Prograde,
    Retrograde,
    NormalPlus,
    NormalMinus,
    RadialPlus,
    RadialMinus,
    TargetPlus,
    TargetMinus,
    RelativePlus,
    RelativeMinus,
    ParallelPlus,
    ParallelMinus,
    Surface,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogCommand {
    Status,
    On,
    Off,
    All,
    None,
    Add(Vec<String>),
    Remove(Vec<String>),
    File { path: PathBuf, mode: FileMode },
}

/// What the UI should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    ShowText(String),
    ShowTelemetry,
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Run one command.
///
/// `Connect` blocks until the attempt resolves; call it where blocking is
/// allowed.
pub fn execute(command: Command, session: &Session, sink: &mut dyn ResultSink) -> Outcome {
    debug!(?command, "executing command");
    let result = match command {
        Command::Connect { address, port } => connect(session, &address, port, sink),
        Command::Disconnect => Ok(disconnect(session, sink)),
        Command::Log(log) => log::execute(log, session, sink),
        flight => flight::execute(flight, session, sink),
    };

    result.unwrap_or_else(|err| {
        sink.report(level_of(&err), &err.to_string());
        Outcome::Done
    })
}

fn level_of(err: &CoreError) -> Level {
    match err {
        CoreError::AlreadyConnected => Level::Warning,
        CoreError::NetworkThread(_) | CoreError::Io(_) => Level::Critical,
        _ => Level::Error,
    }
}

pub(crate) fn ensure_connected(session: &Session) -> Result<(), CoreError> {
    if session.connected() {
        Ok(())
    } else {
        Err(CoreError::NotConnected)
    }
}

// ── Link commands ────────────────────────────────────────────────────

fn connect(
    session: &Session,
    address: &str,
    port: Option<u16>,
    sink: &mut dyn ResultSink,
) -> Result<Outcome, CoreError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(CoreError::validation("address", "must not be empty"));
    }
    let port = port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(CoreError::validation("port", "must be between 1 and 65535"));
    }
    if session.has_event_loop() {
        sink.warning("Could not connect, already connected to a server!");
        return Ok(Outcome::Done);
    }

    sink.info(&format!("Making connection to {address}:{port}"));
    match session.connect(address, port) {
        Ok(()) => {
            sink.info("Connected!");
            Ok(Outcome::ShowTelemetry)
        }
        Err(e) if e.is_connection_failure() => {
            sink.error(&format!("Could not connect to {address}:{port}: {e}"));
            Ok(Outcome::Done)
        }
        Err(e) => Err(e),
    }
}

fn disconnect(session: &Session, sink: &mut dyn ResultSink) -> Outcome {
    match session.disconnect() {
        Ok(()) => sink.info("Disconnecting"),
        Err(_) => sink.warning("Not currently connected!"),
    }
    Outcome::Done
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::SessionConfig;

    fn run(session: &Session, command: Command) -> (Outcome, Vec<(Level, String)>) {
        let mut feedback = Vec::new();
        let outcome = execute(command, session, &mut feedback);
        (outcome, feedback)
    }

    #[test]
    fn flight_commands_require_a_connection() {
        let session = Session::start(SessionConfig::default()).unwrap();
        for command in [
            Command::Stage,
            Command::Abort,
            Command::Throttle(Throttle::Up),
            Command::Send {
                payload: "{}".into(),
            },
        ] {
            let (outcome, feedback) = run(&session, command);
            assert_eq!(outcome, Outcome::Done);
            assert_eq!(feedback, vec![(Level::Error, "Not connected!".to_owned())]);
        }
        session.shutdown();
    }

    #[test]
    fn disconnect_without_connection_warns() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let (_, feedback) = run(&session, Command::Disconnect);
        assert_eq!(
            feedback,
            vec![(Level::Warning, "Not currently connected!".to_owned())]
        );
        session.shutdown();
    }

    #[test]
    fn connect_rejects_bad_endpoint_without_dialing() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let (_, feedback) = run(
            &session,
            Command::Connect {
                address: "localhost".into(),
                port: Some(0),
            },
        );
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].0, Level::Error);

        let (_, feedback) = run(
            &session,
            Command::Connect {
                address: "  ".into(),
                port: None,
            },
        );
        assert_eq!(feedback[0].0, Level::Error);
        session.shutdown();
    }

    #[test]
    fn smart_ass_modes_parse_from_lowercase() {
        assert_eq!("prograde".parse::<SmartAssMode>().ok(), Some(SmartAssMode::Prograde));
        assert_eq!("normalplus".parse::<SmartAssMode>().ok(), Some(SmartAssMode::NormalPlus));
        assert_eq!("rcs".parse::<Switch>().ok(), Some(Switch::Rcs));
    }
}

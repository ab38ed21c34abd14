// Data log commands. Settings changes are refused while logging runs;
// column changes are mirrored into the subscription ledger so logged
// variables keep streaming.

use std::fmt::Write as _;
use std::iter;

use kerminal_api::catalog;
use kerminal_api::protocol::RECEIPT_TIME;

use super::{LogCommand, Outcome, ResultSink, ensure_connected};
use crate::error::CoreError;
use crate::session::Session;

pub(super) fn execute(
    command: LogCommand,
    session: &Session,
    sink: &mut dyn ResultSink,
) -> Result<Outcome, CoreError> {
    match command {
        LogCommand::Status => Ok(Outcome::ShowText(status(session))),
        LogCommand::On => {
            ensure_connected(session)?;
            let mut datalog = session.datalog();
            if datalog.enable() {
                sink.info(&format!("Logging to {}", datalog.path().display()));
            } else {
                sink.warning("Log is already active");
            }
            Ok(Outcome::Done)
        }
        LogCommand::Off => {
            ensure_connected(session)?;
            if session.datalog().disable() {
                sink.info("Logging stopped");
            } else {
                sink.warning("Log is not active");
            }
            Ok(Outcome::Done)
        }
        LogCommand::All => {
            let added = {
                let mut datalog = session.datalog();
                let mut added = Vec::new();
                for name in iter::once(RECEIPT_TIME).chain(catalog::plottables()) {
                    if datalog.add(name)? {
                        added.push(name.to_owned());
                    }
                }
                added
            };
            subscribe_all(session, &added);
            sink.info(&format!("Added {} variables to the log", added.len()));
            Ok(Outcome::Done)
        }
        LogCommand::None => {
            let removed = session.datalog().retain_mandatory()?;
            unsubscribe_all(session, &removed);
            sink.info(&format!("Removed {} variables from the log", removed.len()));
            Ok(Outcome::Done)
        }
        LogCommand::Add(names) => {
            for name in &names {
                validate_name(name)?;
            }
            let added = {
                let mut datalog = session.datalog();
                let mut added = Vec::new();
                for name in names {
                    if datalog.add(&name)? {
                        added.push(name);
                    } else {
                        sink.warning(&format!("{name} is already logged"));
                    }
                }
                added
            };
            subscribe_all(session, &added);
            if !added.is_empty() {
                sink.info(&format!("Logging {}", added.join(", ")));
            }
            Ok(Outcome::Done)
        }
        LogCommand::Remove(names) => {
            let removed = {
                let mut datalog = session.datalog();
                let mut removed = Vec::new();
                for name in names {
                    match datalog.remove(&name) {
                        Ok(true) => removed.push(name),
                        Ok(false) => sink.warning(&format!("{name} is not being logged")),
                        Err(e @ CoreError::MandatoryVariable { .. }) => sink.error(&e.to_string()),
                        Err(e) => return Err(e),
                    }
                }
                removed
            };
            unsubscribe_all(session, &removed);
            if !removed.is_empty() {
                sink.info(&format!("Stopped logging {}", removed.join(", ")));
            }
            Ok(Outcome::Done)
        }
        LogCommand::File { path, mode } => {
            let mut datalog = session.datalog();
            datalog.set_file(path, mode)?;
            sink.info(&format!("Log file set to {}", datalog.path().display()));
            Ok(Outcome::Done)
        }
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(CoreError::validation(
            "variable name",
            format!("{name:?} is not a variable name"),
        ));
    }
    Ok(())
}

fn subscribe_all(session: &Session, names: &[String]) {
    let mut ledger = session.ledger();
    for name in names {
        ledger.add(name);
    }
}

fn unsubscribe_all(session: &Session, names: &[String]) {
    let mut ledger = session.ledger();
    for name in names {
        ledger.release(name);
    }
}

fn status(session: &Session) -> String {
    let datalog = session.datalog();
    let mut text = String::new();
    let state = if datalog.is_enabled() { "active" } else { "inactive" };
    let _ = writeln!(text, "Data log {state}");
    let _ = writeln!(text, "File: {}", datalog.path().display());
    let _ = writeln!(text, "Variables:");
    for name in datalog.variables() {
        match catalog::label(name) {
            Some(label) => {
                let _ = writeln!(text, "  {name} ({label})");
            }
            None => {
                let _ = writeln!(text, "  {name}");
            }
        }
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::command::{Level, execute as run_command, Command};
    use crate::config::SessionConfig;
    use crate::datalog::FileMode;

    fn run(session: &Session, command: LogCommand) -> Vec<(Level, String)> {
        let mut feedback = Vec::new();
        run_command(Command::Log(command), session, &mut feedback);
        feedback
    }

    #[test]
    fn add_and_remove_mirror_into_ledger() {
        let session = Session::start(SessionConfig::default()).unwrap();

        run(&session, LogCommand::Add(vec!["v.altitude".into(), "o.ApA".into()]));
        assert!(session.ledger().contains("v.altitude"));
        assert!(session.datalog().contains("o.ApA"));

        let feedback = run(&session, LogCommand::Remove(vec!["o.ApA".into(), "n.pitch".into()]));
        assert!(!session.ledger().contains("o.ApA"));
        assert!(feedback.iter().any(|(level, msg)| *level == Level::Warning && msg.contains("n.pitch")));
        session.shutdown();
    }

    #[test]
    fn mandatory_variables_are_protected() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let feedback = run(&session, LogCommand::Remove(vec!["t.universalTime".into()]));
        assert_eq!(feedback[0].0, Level::Error);
        assert!(session.datalog().contains("t.universalTime"));
        session.shutdown();
    }

    #[test]
    fn changes_are_refused_while_active() {
        let session = Session::start(SessionConfig::default()).unwrap();
        session.datalog().enable();

        let feedback = run(&session, LogCommand::Add(vec!["v.altitude".into()]));
        assert_eq!(
            feedback,
            vec![(
                Level::Error,
                "Parameters can't be changed while log is active".to_owned()
            )]
        );
        assert!(!session.datalog().contains("v.altitude"));
        assert!(!session.ledger().contains("v.altitude"));

        let feedback = run(
            &session,
            LogCommand::File {
                path: "other.csv".into(),
                mode: FileMode::Overwrite,
            },
        );
        assert_eq!(feedback[0].0, Level::Error);
        assert_eq!(session.datalog().path(), std::path::Path::new("kerminaldata.csv"));
        session.shutdown();
    }

    #[test]
    fn all_then_none_round_trip_through_ledger() {
        let session = Session::start(SessionConfig::default()).unwrap();
        run(&session, LogCommand::All);
        assert!(session.datalog().contains("sys.time"));
        assert!(session.ledger().contains("o.period"));

        run(&session, LogCommand::None);
        assert_eq!(
            session.datalog().header(),
            "t.universalTime;v.missionTime"
        );
        assert!(!session.ledger().contains("o.period"));
        session.shutdown();
    }

    #[test]
    fn on_requires_connection_and_status_always_works() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let feedback = run(&session, LogCommand::On);
        assert_eq!(feedback, vec![(Level::Error, "Not connected!".to_owned())]);

        let mut sink = Vec::new();
        let outcome = run_command(Command::Log(LogCommand::Status), &session, &mut sink);
        let Outcome::ShowText(text) = outcome else {
            panic!("status should show text");
        };
        assert!(text.starts_with("Data log inactive"));
        assert!(text.contains("t.universalTime (Universal Time)"));
        session.shutdown();
    }

    #[test]
    fn bad_names_are_rejected_before_any_change() {
        let session = Session::start(SessionConfig::default()).unwrap();
        let feedback = run(&session, LogCommand::Add(vec!["v.altitude".into(), "two words".into()]));
        assert_eq!(feedback[0].0, Level::Error);
        assert!(!session.datalog().contains("v.altitude"));
        session.shutdown();
    }
}

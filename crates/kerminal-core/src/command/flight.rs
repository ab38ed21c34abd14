// Vessel control commands. All of them need a live connection and end up
// as a raw message on the outbound queue.

use serde_json::Value;

use kerminal_api::protocol;

use super::{Command, FlyByWire, Outcome, ResultSink, SmartAssMode, Throttle, ensure_connected};
use crate::error::CoreError;
use crate::session::Session;

pub(super) fn execute(
    command: Command,
    session: &Session,
    sink: &mut dyn ResultSink,
) -> Result<Outcome, CoreError> {
    ensure_connected(session)?;

    let message = match command {
        Command::Abort => {
            sink.info("Aborting!");
            run_one("f.abort")
        }
        Command::Stage => {
            sink.info("Staging");
            run_one("f.stage")
        }
        Command::ActionGroup { group } => {
            if !(1..=10).contains(&group) {
                return Err(CoreError::validation(
                    "action group",
                    format!("{group} is not between 1 and 10"),
                ));
            }
            sink.info(&format!("Triggering action group {group}"));
            run_one(format!("f.ag{group}"))
        }
        Command::Switch { system, on } => {
            sink.info(&format!("Turning {system} {}", if on { "on" } else { "off" }));
            run_one(format!("{}[{}]", system.action(), python_bool(on)))
        }
        Command::FlyByWire(fbw) => fly_by_wire(fbw, sink)?,
        Command::Throttle(throttle) => self::throttle(throttle, sink),
        Command::Rate { interval_ms } => {
            let ms = rate_interval(interval_ms)?;
            sink.info(&format!("Setting update rate to {ms} ms"));
            protocol::rate(ms)
        }
        Command::SmartAss {
            mode,
            heading,
            pitch,
        } => smart_ass(mode, heading, pitch, sink)?,
        Command::Send { payload } => {
            let message = parse_payload(&payload)?;
            sink.info("Sending message");
            message
        }
        Command::Connect { .. } | Command::Disconnect | Command::Log(_) => {
            return Ok(Outcome::Done);
        }
    };

    session.send(message);
    Ok(Outcome::Done)
}

fn run_one(action: impl Into<String>) -> Value {
    protocol::run([action.into()])
}

/// The server parses arguments the way the game's scripting side prints them.
fn python_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Render a float with a decimal point even when it is integral.
fn number(value: f64) -> String {
    format!("{value:?}")
}

fn fly_by_wire(fbw: FlyByWire, sink: &mut dyn ResultSink) -> Result<Value, CoreError> {
    match fbw {
        FlyByWire::Enable(on) => {
            sink.info(if on { "Fly-by-wire enabled" } else { "Fly-by-wire disabled" });
            Ok(run_one(format!("v.setFbW[{}]", u8::from(on))))
        }
        FlyByWire::Axes { yaw, pitch, roll } => {
            let actions: Vec<String> = [("v.setYaw", yaw), ("v.setPitch", pitch), ("v.setRoll", roll)]
                .into_iter()
                .filter_map(|(action, value)| value.map(|v| format!("{action}[{}]", number(v))))
                .collect();
            if actions.is_empty() {
                return Err(CoreError::validation(
                    "fly-by-wire",
                    "give at least one of yaw, pitch or roll",
                ));
            }
            sink.info("Setting fly-by-wire axes");
            Ok(protocol::run(actions))
        }
    }
}

fn throttle(throttle: Throttle, sink: &mut dyn ResultSink) -> Value {
    match throttle {
        Throttle::Up => {
            sink.info("Throttle up");
            run_one("f.throttleUp")
        }
        Throttle::Down => {
            sink.info("Throttle down");
            run_one("f.throttleDown")
        }
        Throttle::Percent(percent) => {
            let magnitude = if percent.is_nan() || percent < 0.0 {
                sink.warning("Setting throttle to 0%, cannot go lower!");
                0.0
            } else if percent > 100.0 {
                sink.warning("Setting throttle to 100%, cannot go higher!");
                1.0
            } else {
                sink.info(&format!("Setting throttle to {percent}%"));
                percent / 100.0
            };
            run_one(format!("f.setThrottle[{}]", number(magnitude)))
        }
    }
}

fn rate_interval(interval_ms: f64) -> Result<u32, CoreError> {
    let rounded = interval_ms.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
        return Err(CoreError::validation(
            "rate",
            format!("{interval_ms} is not a positive number of milliseconds"),
        ));
    }
    // Range checked above
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    let ms = rounded as u32;
    Ok(ms)
}

fn smart_ass(
    mode: SmartAssMode,
    heading: Option<f64>,
    pitch: Option<f64>,
    sink: &mut dyn ResultSink,
) -> Result<Value, CoreError> {
    let action = match mode {
        SmartAssMode::Off => "mj.smartassoff".to_owned(),
        SmartAssMode::Surface => {
            let (Some(heading), Some(pitch)) = (heading, pitch) else {
                return Err(CoreError::validation(
                    "surface mode",
                    "needs both heading and pitch",
                ));
            };
            format!("mj.surface[{},{}]", number(heading), number(pitch))
        }
        other => {
            let name: &'static str = other.into();
            format!("mj.{name}")
        }
    };
    sink.info(&format!("SmartASS: {mode}"));
    Ok(run_one(action))
}

fn parse_payload(payload: &str) -> Result<Value, CoreError> {
    match serde_json::from_str::<Value>(payload) {
        Ok(message @ Value::Object(_)) => Ok(message),
        Ok(_) => Err(CoreError::Payload {
            message: "expected a JSON object".into(),
        }),
        Err(e) => Err(CoreError::Payload {
            message: format!("could not parse JSON: {e}"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::command::Level;

    #[test]
    fn throttle_percent_is_clamped_with_warning() {
        let mut feedback = Vec::new();
        assert_eq!(
            throttle(Throttle::Percent(150.0), &mut feedback),
            json!({"run": ["f.setThrottle[1.0]"]})
        );
        assert_eq!(
            throttle(Throttle::Percent(-3.0), &mut feedback),
            json!({"run": ["f.setThrottle[0.0]"]})
        );
        assert_eq!(
            throttle(Throttle::Percent(50.0), &mut feedback),
            json!({"run": ["f.setThrottle[0.5]"]})
        );
        let levels: Vec<Level> = feedback.iter().map(|(level, _)| *level).collect();
        assert_eq!(levels, vec![Level::Warning, Level::Warning, Level::Info]);
    }

    #[test]
    fn fly_by_wire_needs_an_axis() {
        let mut feedback = Vec::new();
        let none = FlyByWire::Axes {
            yaw: None,
            pitch: None,
            roll: None,
        };
        assert!(fly_by_wire(none, &mut feedback).is_err());

        let yaw_roll = FlyByWire::Axes {
            yaw: Some(0.5),
            pitch: None,
            roll: Some(-1.0),
        };
        assert_eq!(
            fly_by_wire(yaw_roll, &mut feedback).unwrap(),
            json!({"run": ["v.setYaw[0.5]", "v.setRoll[-1.0]"]})
        );
    }

    #[test]
    fn rate_rounds_and_rejects_nonsense() {
        assert_eq!(rate_interval(499.6).unwrap(), 500);
        assert!(rate_interval(0.2).is_err());
        assert!(rate_interval(-10.0).is_err());
        assert!(rate_interval(f64::NAN).is_err());
    }

    #[test]
    fn smart_ass_action_names() {
        let mut feedback = Vec::new();
        assert_eq!(
            smart_ass(SmartAssMode::RadialMinus, None, None, &mut feedback).unwrap(),
            json!({"run": ["mj.radialminus"]})
        );
        assert_eq!(
            smart_ass(SmartAssMode::Surface, Some(90.0), Some(45.0), &mut feedback).unwrap(),
            json!({"run": ["mj.surface[90.0,45.0]"]})
        );
        assert!(smart_ass(SmartAssMode::Surface, Some(90.0), None, &mut feedback).is_err());
    }

    #[test]
    fn send_requires_a_json_object() {
        assert_eq!(
            parse_payload(r#"{"rate": 100}"#).unwrap(),
            json!({"rate": 100})
        );
        assert!(parse_payload("[1, 2]").is_err());
        assert!(parse_payload("{oops").is_err());
    }
}

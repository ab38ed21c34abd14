//! Telemachus datalink message vocabulary.
//!
//! Outbound messages are flat JSON objects keyed by verb: `"+"` subscribes,
//! `"-"` unsubscribes, `"rate"` sets the update interval and `"run"` fires
//! actions. Inbound messages are flat objects mapping variable names to
//! their latest values.

use serde_json::{Map, Value, json};

// ── Endpoint ─────────────────────────────────────────────────────────

/// Port the Telemachus server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8085;

/// Path of the datalink WebSocket endpoint.
pub const DATALINK_PATH: &str = "/datalink";

// ── Message keys ─────────────────────────────────────────────────────

pub const SUBSCRIBE: &str = "+";
pub const UNSUBSCRIBE: &str = "-";
pub const RATE: &str = "rate";
pub const RUN: &str = "run";

// ── Well-known variables ─────────────────────────────────────────────

pub const VESSEL_NAME: &str = "v.name";
pub const PAUSED: &str = "p.paused";
pub const UNIVERSAL_TIME: &str = "t.universalTime";
pub const MISSION_TIME: &str = "v.missionTime";

/// Local receipt timestamp attached to every inbound record. Never
/// produced by the server.
pub const RECEIPT_TIME: &str = "sys.time";

/// Variables needed to interpret every inbound message. Subscribed on
/// each successful handshake, outside of any reference counting.
pub const ALWAYS_ON: [&str; 4] = [VESSEL_NAME, PAUSED, UNIVERSAL_TIME, MISSION_TIME];

/// One decoded inbound message.
pub type Record = Map<String, Value>;

// ── Builders ─────────────────────────────────────────────────────────

/// Ask the server to push updates every `interval_ms` milliseconds.
pub fn rate(interval_ms: u32) -> Value {
    json!({ RATE: interval_ms })
}

/// Fire one or more server-side actions (`f.stage`, `f.gear[True]`, ...).
pub fn run<I, S>(actions: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    json!({ RUN: collect_names(actions) })
}

/// The first message sent on every connection: the always-on set, plus
/// the requested update interval when one is configured.
pub fn handshake(rate_ms: Option<u32>) -> Value {
    let mut msg = Map::new();
    msg.insert(SUBSCRIBE.into(), Value::from(collect_names(ALWAYS_ON)));
    if let Some(ms) = rate_ms {
        msg.insert(RATE.into(), Value::from(ms));
    }
    Value::Object(msg)
}

fn collect_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

// ── Inbound parsing ──────────────────────────────────────────────────

/// Decode a text frame into a [`Record`]. Anything but a JSON object is
/// rejected.
pub fn parse_record(text: &str) -> Result<Record, crate::Error> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(crate::Error::Deserialization {
            message: format!("expected a JSON object, got {}", kind_of(&other)),
            body: text.to_owned(),
        }),
        Err(e) => Err(crate::Error::Deserialization {
            message: e.to_string(),
            body: text.to_owned(),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

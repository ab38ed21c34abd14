// ── Live data store ──
//
// Latest value per variable name. Written only by the network thread,
// read from anywhere. Each key is replaced atomically, but a reader that
// fetches several keys may see them from different inbound messages:
// there is no multi-variable snapshot.

use dashmap::DashMap;
use serde_json::Value;

use kerminal_api::Record;

/// Rendered in place of a value the store does not hold.
pub const NOT_AVAILABLE: &str = "N/A";

pub struct LiveDataStore {
    values: DashMap<String, Value>,
}

impl LiveDataStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Merge one inbound record: incoming keys overwrite, others are kept.
    pub fn merge(&self, record: Record) {
        for (name, value) in record {
            self.values.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Display form of a value: strings unquoted, everything else as JSON,
    /// and [`NOT_AVAILABLE`] when absent.
    pub fn display(&self, name: &str) -> String {
        self.values
            .get(name)
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |entry| render(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop everything. Called when the connection that produced the
    /// values goes away.
    pub fn clear(&self) {
        self.values.clear();
    }
}

impl Default for LiveDataStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a single value the way it appears on screen and in data logs.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => Record::new(),
        }
    }

    #[test]
    fn merge_overwrites_only_incoming_keys() {
        let store = LiveDataStore::new();
        store.merge(record(json!({"v.altitude": 100, "v.name": "Kerbal X"})));
        store.merge(record(json!({"v.altitude": 250})));

        assert_eq!(store.get("v.altitude"), Some(json!(250)));
        assert_eq!(store.get("v.name"), Some(json!("Kerbal X")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn display_handles_missing_and_strings() {
        let store = LiveDataStore::new();
        assert_eq!(store.display("o.ApA"), "N/A");

        store.merge(record(json!({"v.name": "Kerbal X", "o.ApA": 80000.5})));
        assert_eq!(store.display("v.name"), "Kerbal X");
        assert_eq!(store.display("o.ApA"), "80000.5");
    }

    #[test]
    fn clear_empties_the_store() {
        let store = LiveDataStore::new();
        store.merge(record(json!({"v.altitude": 1})));
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.display("v.altitude"), "N/A");
    }
}

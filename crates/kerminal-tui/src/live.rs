//! Live display elements.
//!
//! A live element is bound to one variable. On every poll tick it pulls the
//! latest value from the store and keeps the rendered text; rendering never
//! touches the store. A variable the store does not hold shows as `N/A`.

use kerminal_api::catalog;
use kerminal_core::{LiveDataStore, NOT_AVAILABLE};

use crate::widgets::format::Format;

#[derive(Debug, Clone)]
pub struct LiveElement {
    name: String,
    label: String,
    format: Format,
    text: String,
    available: bool,
}

impl LiveElement {
    pub fn new(name: impl Into<String>, label: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            format,
            text: NOT_AVAILABLE.to_owned(),
            available: false,
        }
    }

    /// Label taken from the variable catalog, or the raw name if unknown.
    pub fn cataloged(name: &str, format: Format) -> Self {
        Self::new(name, catalog::label(name).unwrap_or(name), format)
    }

    /// Refresh from the store. Idempotent.
    pub fn feed(&mut self, store: &LiveDataStore) {
        match store.get(&self.name) {
            Some(value) => {
                self.text = self.format.apply(&value);
                self.available = true;
            }
            None => {
                NOT_AVAILABLE.clone_into(&mut self.text);
                self.available = false;
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn store_with(pairs: &[(&str, serde_json::Value)]) -> LiveDataStore {
        let store = LiveDataStore::new();
        let record = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect();
        store.merge(record);
        store
    }

    #[test]
    fn absent_value_renders_not_available() {
        let mut element = LiveElement::cataloged("o.ApA", Format::Distance);
        element.feed(&LiveDataStore::new());
        assert_eq!(element.text(), "N/A");
        assert!(!element.is_available());
        assert_eq!(element.label(), "Apoapsis");
    }

    #[test]
    fn feed_formats_and_tracks_removal() {
        let mut element = LiveElement::cataloged("v.altitude", Format::Distance);
        let store = store_with(&[("v.altitude", json!(75_000.0))]);
        element.feed(&store);
        assert_eq!(element.text(), "75.000 km");

        // Feeding twice changes nothing.
        element.feed(&store);
        assert_eq!(element.text(), "75.000 km");

        store.clear();
        element.feed(&store);
        assert_eq!(element.text(), "N/A");
    }

    #[test]
    fn unknown_variables_label_themselves() {
        let element = LiveElement::cataloged("x.custom", Format::Raw);
        assert_eq!(element.label(), "x.custom");
    }
}

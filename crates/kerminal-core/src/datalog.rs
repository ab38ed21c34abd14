// ── Data log ──
//
// Optional CSV-like recording of selected variables, one line per
// accepted inbound update. `DataLogConfig` is shared between the command
// layer and the network thread; `DataLogger` holds the open file and
// lives on the network thread only.

use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{debug, error, info};

use kerminal_api::protocol::{MISSION_TIME, UNIVERSAL_TIME};

use crate::error::CoreError;
use crate::store::{LiveDataStore, NOT_AVAILABLE, render};

/// Variables every data log carries. They cannot be removed.
pub const MANDATORY: [&str; 2] = [UNIVERSAL_TIME, MISSION_TIME];

/// What to do when the chosen log file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Refuse an existing file.
    #[default]
    Create,
    /// Keep existing lines and write after them.
    Append,
    /// Delete the existing file first.
    Overwrite,
}

// ── Configuration ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DataLogConfig {
    enabled: bool,
    path: PathBuf,
    variables: IndexSet<String>,
    delimiter: String,
}

impl DataLogConfig {
    pub fn new(path: impl Into<PathBuf>, delimiter: impl Into<String>) -> Self {
        Self {
            enabled: false,
            path: path.into(),
            variables: default_variables(),
            delimiter: delimiter.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Logged variables in column order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    /// Switch logging on. Returns `false` if it already was.
    pub fn enable(&mut self) -> bool {
        !std::mem::replace(&mut self.enabled, true)
    }

    /// Switch logging off. Returns `false` if it already was.
    pub fn disable(&mut self) -> bool {
        std::mem::replace(&mut self.enabled, false)
    }

    /// Point the log at another file.
    pub fn set_file(&mut self, path: impl Into<PathBuf>, mode: FileMode) -> Result<(), CoreError> {
        self.ensure_inactive()?;
        let path = path.into();

        if path.is_dir() {
            return Err(CoreError::DataLogFile {
                path,
                reason: "is a directory".into(),
            });
        }
        if path.exists() {
            match mode {
                FileMode::Create => {
                    return Err(CoreError::DataLogFile {
                        path,
                        reason: "already exists, choose append or overwrite".into(),
                    });
                }
                FileMode::Append => {}
                FileMode::Overwrite => {
                    fs::remove_file(&path).map_err(|e| CoreError::DataLogFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                }
            }
        }

        info!(path = %path.display(), ?mode, "data log file set");
        self.path = path;
        Ok(())
    }

    /// Add a column. Returns `false` if it was already logged.
    pub fn add(&mut self, name: &str) -> Result<bool, CoreError> {
        self.ensure_inactive()?;
        Ok(self.variables.insert(name.to_owned()))
    }

    /// Remove a column. Returns `false` if it was not logged.
    pub fn remove(&mut self, name: &str) -> Result<bool, CoreError> {
        self.ensure_inactive()?;
        if MANDATORY.contains(&name) {
            return Err(CoreError::MandatoryVariable {
                name: name.to_owned(),
            });
        }
        Ok(self.variables.shift_remove(name))
    }

    /// Keep only the mandatory columns. Returns the removed names.
    pub fn retain_mandatory(&mut self) -> Result<Vec<String>, CoreError> {
        self.ensure_inactive()?;
        let removed = self
            .variables
            .iter()
            .filter(|name| !MANDATORY.contains(&name.as_str()))
            .cloned()
            .collect();
        self.variables = default_variables();
        Ok(removed)
    }

    /// Back to the state of a fresh session: off, mandatory columns only.
    /// The file path is a user preference and survives.
    pub fn reset(&mut self) {
        self.enabled = false;
        self.variables = default_variables();
    }

    /// Header line, without the line terminator.
    pub fn header(&self) -> String {
        self.variables
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    /// One data line from the current store contents.
    pub fn row(&self, store: &LiveDataStore) -> String {
        self.variables
            .iter()
            .map(|name| {
                store
                    .get(name)
                    .map_or_else(|| NOT_AVAILABLE.to_owned(), |value| render(&value))
            })
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    fn ensure_inactive(&self) -> Result<(), CoreError> {
        if self.enabled {
            return Err(CoreError::LogActive);
        }
        Ok(())
    }
}

fn default_variables() -> IndexSet<String> {
    MANDATORY.iter().map(|name| (*name).to_owned()).collect()
}

// ── Writer ───────────────────────────────────────────────────────────

/// Open data log file, if any.
#[derive(Debug, Default)]
pub struct DataLogger {
    file: Option<LineWriter<File>>,
}

impl DataLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Handle one accepted update. Opens the file and writes the header on
    /// the first update after logging is enabled, closes it once logging
    /// is switched off.
    ///
    /// An I/O failure switches logging off so the user sees it stopped.
    pub fn record(&mut self, config: &mut DataLogConfig, store: &LiveDataStore) {
        if !config.is_enabled() {
            self.close();
            return;
        }
        if let Err(e) = self.write_row(config, store) {
            error!(path = %config.path().display(), error = %e, "data log write failed, logging stopped");
            self.close();
            config.disable();
        }
    }

    fn write_row(&mut self, config: &DataLogConfig, store: &LiveDataStore) -> std::io::Result<()> {
        if self.file.is_none() {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(config.path())?;
            info!(path = %config.path().display(), "data log opened");
            let mut file = LineWriter::new(handle);
            writeln!(file, "{}", config.header())?;
            self.file = Some(file);
        }
        if let Some(file) = &mut self.file {
            writeln!(file, "{}", config.row(store))?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                error!(error = %e, "data log flush failed");
            }
            debug!("data log closed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn store_with(value: serde_json::Value) -> LiveDataStore {
        let store = LiveDataStore::new();
        if let serde_json::Value::Object(map) = value {
            store.merge(map);
        }
        store
    }

    #[test]
    fn defaults_hold_mandatory_variables() {
        let config = DataLogConfig::new("kerminaldata.csv", ";");
        assert!(!config.is_enabled());
        assert_eq!(config.header(), "t.universalTime;v.missionTime");
    }

    #[test]
    fn changes_rejected_while_enabled() {
        let mut config = DataLogConfig::new("a.csv", ";");
        config.enable();

        assert!(matches!(config.add("v.altitude"), Err(CoreError::LogActive)));
        assert!(matches!(config.remove("v.altitude"), Err(CoreError::LogActive)));
        assert!(matches!(config.retain_mandatory(), Err(CoreError::LogActive)));
        assert!(matches!(config.set_file("b.csv", FileMode::Overwrite), Err(CoreError::LogActive)));

        assert_eq!(config.path(), Path::new("a.csv"));
        assert_eq!(config.variables().count(), 2);
    }

    #[test]
    fn mandatory_variables_cannot_be_removed() {
        let mut config = DataLogConfig::new("a.csv", ";");
        let err = config.remove("v.missionTime").unwrap_err();
        assert!(matches!(err, CoreError::MandatoryVariable { .. }));
        assert!(config.contains("v.missionTime"));
    }

    #[test]
    fn add_remove_and_retain() {
        let mut config = DataLogConfig::new("a.csv", ";");
        assert!(config.add("v.altitude").unwrap());
        assert!(!config.add("v.altitude").unwrap());
        assert!(config.add("o.ApA").unwrap());
        assert!(config.remove("v.altitude").unwrap());
        assert!(!config.remove("v.altitude").unwrap());

        assert_eq!(config.retain_mandatory().unwrap(), vec!["o.ApA".to_owned()]);
        assert_eq!(config.header(), "t.universalTime;v.missionTime");
    }

    #[test]
    fn set_file_respects_mode() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("old.csv");
        fs::write(&existing, "keep me\n").unwrap();
        let mut config = DataLogConfig::new("a.csv", ";");

        assert!(config.set_file(dir.path(), FileMode::Append).is_err());
        assert!(config.set_file(&existing, FileMode::Create).is_err());

        config.set_file(&existing, FileMode::Append).unwrap();
        assert!(existing.exists());

        config.set_file(&existing, FileMode::Overwrite).unwrap();
        assert!(!existing.exists());
        assert_eq!(config.path(), existing.as_path());
    }

    #[test]
    fn header_then_one_row_per_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut config = DataLogConfig::new(&path, ";");
        config.add("v.name").unwrap();
        config.add("v.altitude").unwrap();
        config.enable();

        let store = store_with(json!({
            "t.universalTime": 1000.5,
            "v.missionTime": 12,
            "v.name": "Kerbal X",
        }));
        let mut logger = DataLogger::new();
        logger.record(&mut config, &store);
        logger.record(&mut config, &store);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "t.universalTime;v.missionTime;v.name;v.altitude\n\
             1000.5;12;Kerbal X;N/A\n\
             1000.5;12;Kerbal X;N/A\n"
        );
    }

    #[test]
    fn disabling_closes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DataLogConfig::new(dir.path().join("log.csv"), ";");
        let store = LiveDataStore::new();
        let mut logger = DataLogger::new();

        config.enable();
        logger.record(&mut config, &store);
        assert!(logger.is_open());

        config.disable();
        logger.record(&mut config, &store);
        assert!(!logger.is_open());
    }

    #[test]
    fn unwritable_path_switches_logging_off() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DataLogConfig::new(dir.path().join("missing/dir/log.csv"), ";");
        config.enable();

        let mut logger = DataLogger::new();
        logger.record(&mut config, &LiveDataStore::new());

        assert!(!config.is_enabled());
        assert!(!logger.is_open());
    }

    #[test]
    fn reset_keeps_path_and_disables() {
        let mut config = DataLogConfig::new("a.csv", ";");
        config.add("v.altitude").unwrap();
        config.enable();

        config.reset();
        assert!(!config.is_enabled());
        assert_eq!(config.path(), Path::new("a.csv"));
        assert_eq!(config.header(), "t.universalTime;v.missionTime");
    }
}

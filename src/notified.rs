//! Ledger of already-notified post ids
//!
//! The ledger is a pretty-printed JSON array of id strings. A missing file
//! means the relay has never run and triggers bootstrap mode; an existing but
//! unreadable or malformed file is fatal, because guessing at its contents
//! would either re-send old notifications or silently erase history.

use crate::error::{Error, Result};
use crate::utils::write_atomic;
use std::path::PathBuf;

/// Ordered record of every post id that has been notified
#[derive(Debug)]
pub struct Notified {
    path: PathBuf,
    ids: Vec<String>,
    first_run: bool,
}

impl Notified {
    /// Load the ledger, or start an empty first-run ledger if the file is absent
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self {
                path,
                ids: Vec::new(),
                first_run: true,
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            Error::Ledger(format!("could not read {}: {e}", path.display()))
        })?;
        let ids: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            Error::Ledger(format!("could not parse {}: {e}", path.display()))
        })?;

        Ok(Self {
            path,
            ids,
            first_run: false,
        })
    }

    /// Whether the ledger file was absent when this instance was constructed
    ///
    /// Fixed at construction: saving during the run does not flip it.
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    /// Whether the given post id has already been notified
    pub fn is_notified(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    /// Record an id in memory without touching the file
    ///
    /// Duplicates are ignored. Used during bootstrap to batch many ids into
    /// a single [`save`](Self::save).
    pub fn add_without_save(&mut self, id: &str) {
        if !self.is_notified(id) {
            self.ids.push(id.to_string());
        }
    }

    /// Write the ledger to disk
    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, &serde_json::to_string_pretty(&self.ids)?)?;
        tracing::debug!(count = self.ids.len(), "Saved notified ledger");
        Ok(())
    }

    /// Record an id and persist immediately
    pub fn add(&mut self, id: &str) -> Result<()> {
        self.add_without_save(id);
        self.save()
    }

    /// Number of recorded ids
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the ledger holds no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_file_starts_an_empty_first_run_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Notified::new(temp_dir.path().join("notified.json")).unwrap();

        assert!(ledger.is_first_run());
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn existing_file_loads_ids_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");
        std::fs::write(&path, r#"["10", "11", "12"]"#).unwrap();

        let ledger = Notified::new(&path).unwrap();

        assert!(!ledger.is_first_run());
        assert_eq!(ledger.len(), 3);
        assert!(ledger.is_notified("10"));
        assert!(ledger.is_notified("12"));
        assert!(!ledger.is_notified("13"));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");
        std::fs::write(&path, "[\"10\",").unwrap();

        let err = Notified::new(&path).unwrap_err();
        assert!(matches!(err, Error::Ledger(_)), "got {err:?}");
    }

    #[test]
    fn non_array_shape_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");
        std::fs::write(&path, r#"{"not": "an array"}"#).unwrap();

        let err = Notified::new(&path).unwrap_err();
        assert!(matches!(err, Error::Ledger(_)), "got {err:?}");
    }

    #[test]
    fn array_of_numbers_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");
        std::fs::write(&path, "[10, 11]").unwrap();

        assert!(Notified::new(&path).is_err());
    }

    #[test]
    fn add_persists_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");

        let mut ledger = Notified::new(&path).unwrap();
        ledger.add("42").unwrap();

        let reloaded = Notified::new(&path).unwrap();
        assert!(reloaded.is_notified("42"));
        assert!(!reloaded.is_first_run());
    }

    #[test]
    fn add_without_save_stays_in_memory_until_saved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");

        let mut ledger = Notified::new(&path).unwrap();
        ledger.add_without_save("42");
        assert!(ledger.is_notified("42"));
        assert!(!path.exists(), "no file should exist before save");

        ledger.save().unwrap();
        assert!(Notified::new(&path).unwrap().is_notified("42"));
    }

    #[test]
    fn duplicate_ids_are_recorded_once() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Notified::new(temp_dir.path().join("notified.json")).unwrap();

        ledger.add_without_save("42");
        ledger.add_without_save("42");

        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn first_run_flag_does_not_flip_after_save() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Notified::new(temp_dir.path().join("notified.json")).unwrap();

        ledger.add("42").unwrap();

        assert!(
            ledger.is_first_run(),
            "first_run is fixed at construction even once the file exists"
        );
    }

    #[test]
    fn ledger_is_debug_printable() {
        // Error-path assertions on Notified::new format the Ok value too,
        // so the struct has to render with {:?}
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Notified::new(temp_dir.path().join("notified.json")).unwrap();
        ledger.add_without_save("42");

        let rendered = format!("{ledger:?}");
        assert!(rendered.contains("first_run"), "got {rendered}");
        assert!(rendered.contains("42"), "got {rendered}");
    }

    #[test]
    fn saved_file_is_a_pretty_printed_string_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notified.json");

        let mut ledger = Notified::new(&path).unwrap();
        ledger.add_without_save("10");
        ledger.add_without_save("11");
        ledger.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains('\n'), "ledger should be pretty-printed");
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["10".to_string(), "11".to_string()]);
    }
}

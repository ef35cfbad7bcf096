//! Whole-snapshot record storage.
//!
//! Every service operation loads the entire collection, mutates it in memory and saves the
//! entire collection back. There is no locking between load and save: two requests racing on
//! the same store each write back what they loaded plus their own change, so the last save wins
//! and the other change is lost.
//!
//! ## Storage Layout
//!
//! ```text
//! {
//!   "P001": { "name": "...", "age": 30, "email": null, "gender": "...", "city": "...",
//!             "disease": "...", "height": 5.8, "weight": 70.5 },
//!   ...
//! }
//! ```
//!
//! The identifier is the key and is not repeated inside the record. Key order is preserved.

use crate::constants::EMPTY_DOCUMENT;
use crate::{PatientError, PatientResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One stored patient: every field except the identifier.
pub type Record = Map<String, Value>;

/// The entire collection of records at one point in time, keyed by patient identifier.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    // Invariant: every value is a JSON object.
    records: Map<String, Value>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id).and_then(Value::as_object)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Inserts or replaces a record. A replaced record keeps its position.
    pub fn insert(&mut self, id: impl Into<String>, record: Record) {
        self.records.insert(id.into(), Value::Object(record));
    }

    /// Removes a record, keeping the order of the remaining entries.
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        match self.records.shift_remove(id) {
            Some(Value::Object(record)) => Some(record),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records
            .iter()
            .filter_map(|(id, value)| value.as_object().map(|record| (id.as_str(), record)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'de> serde::Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records = Map::<String, Value>::deserialize(deserializer)?;
        if let Some((id, _)) = records.iter().find(|(_, value)| !value.is_object()) {
            return Err(serde::de::Error::custom(format!(
                "record {id} is not a JSON object"
            )));
        }
        Ok(Self { records })
    }
}

impl FromIterator<(String, Record)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (id, record) in iter {
            snapshot.insert(id, record);
        }
        snapshot
    }
}

/// Persistence collaborator for the patient service.
///
/// Implementations replace the whole snapshot on `save`; there are no partial reads or writes.
pub trait RecordStore: Send + Sync {
    /// Returns the full current snapshot.
    ///
    /// # Errors
    /// Returns `PatientError::StorageUnavailable` if the backing resource cannot be read.
    fn load(&self) -> PatientResult<Snapshot>;

    /// Replaces the entire persisted snapshot.
    ///
    /// # Errors
    /// Returns `PatientError::StorageWrite` or `PatientError::Serialization` if the snapshot
    /// cannot be written.
    fn save(&self, snapshot: &Snapshot) -> PatientResult<()>;
}

/// Record store backed by a single JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty document if no data file exists yet.
    ///
    /// Returns `true` if a file was created, `false` if one was already present.
    pub fn initialise(&self) -> PatientResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent).map_err(PatientError::StorageWrite)?;
        }
        fs::write(&self.path, EMPTY_DOCUMENT).map_err(PatientError::StorageWrite)?;
        tracing::info!("initialised empty patient data file: {}", self.path.display());

        Ok(true)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn unavailable(&self, reason: impl ToString) -> PatientError {
        PatientError::StorageUnavailable {
            location: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> PatientResult<Snapshot> {
        let contents = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        serde_json::from_str(&contents).map_err(|e| self.unavailable(e))
    }

    fn save(&self, snapshot: &Snapshot) -> PatientResult<()> {
        let bytes = serde_json::to_vec(snapshot).map_err(PatientError::Serialization)?;

        // Write beside the target and rename over it so readers never see a partial document.
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(PatientError::StorageWrite)?;
        tmp.write_all(&bytes).map_err(PatientError::StorageWrite)?;
        tmp.as_file().sync_all().map_err(PatientError::StorageWrite)?;
        tmp.persist(&self.path)
            .map_err(|e| PatientError::StorageWrite(e.error))?;

        Ok(())
    }
}

/// In-process record store.
///
/// Useful for tests and for embedding the service without a data file. The store can be seeded
/// with arbitrary records, including ones that would not pass validation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    fn poisoned() -> PatientError {
        PatientError::StorageUnavailable {
            location: "memory".into(),
            reason: "snapshot lock poisoned".into(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> PatientResult<Snapshot> {
        let snapshot = self.snapshot.lock().map_err(|_| Self::poisoned())?;
        Ok(snapshot.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> PatientResult<()> {
        let mut current = self.snapshot.lock().map_err(|_| Self::poisoned())?;
        *current = snapshot.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().expect("test record should be an object")
    }

    #[test]
    fn test_load_missing_file_is_unavailable() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonFileStore::new(temp_dir.path().join("patients.json"));

        let err = store.load().expect_err("missing file should fail");
        assert!(
            matches!(err, PatientError::StorageUnavailable { .. }),
            "should return StorageUnavailable"
        );
    }

    #[test]
    fn test_load_corrupt_file_is_unavailable() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("patients.json");

        for contents in ["not json", "[1, 2, 3]", r#"{"P001": 42}"#] {
            fs::write(&path, contents).expect("should write data file");
            let err = JsonFileStore::new(&path)
                .load()
                .expect_err("corrupt document should fail");
            assert!(
                matches!(err, PatientError::StorageUnavailable { .. }),
                "{contents} should be reported as StorageUnavailable"
            );
        }
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonFileStore::new(temp_dir.path().join("patients.json"));

        let mut snapshot = Snapshot::new();
        snapshot.insert("P003", record(json!({"name": "C", "age": 40})));
        snapshot.insert("P001", record(json!({"name": "A", "age": 30})));
        snapshot.insert("P002", record(json!({"name": "B", "age": 20})));
        snapshot.remove("P001");

        store.save(&snapshot).expect("save should succeed");
        let loaded = store.load().expect("load should succeed");

        let ids: Vec<&str> = loaded.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["P003", "P002"]);
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_save_writes_id_keyed_document() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("patients.json");
        let store = JsonFileStore::new(&path);

        let mut snapshot = Snapshot::new();
        snapshot.insert("P001", record(json!({"name": "A"})));
        store.save(&snapshot).expect("save should succeed");

        let raw = fs::read_to_string(&path).expect("should read data file");
        let document: Value = serde_json::from_str(&raw).expect("should parse data file");
        assert_eq!(document, json!({"P001": {"name": "A"}}));
    }

    #[test]
    fn test_initialise_creates_empty_document_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("patients.json");
        let store = JsonFileStore::new(&path);

        assert!(store.initialise().expect("initialise should succeed"));
        assert!(store.load().expect("load should succeed").is_empty());

        let mut snapshot = Snapshot::new();
        snapshot.insert("P001", record(json!({"name": "A"})));
        store.save(&snapshot).expect("save should succeed");

        assert!(!store.initialise().expect("initialise should succeed"));
        assert_eq!(store.load().expect("load should succeed").len(), 1);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().expect("load should succeed").is_empty());

        let snapshot: Snapshot = vec![("P001".to_string(), record(json!({"name": "A"})))]
            .into_iter()
            .collect();
        store.save(&snapshot).expect("save should succeed");

        assert_eq!(store.load().expect("load should succeed"), snapshot);
    }
}

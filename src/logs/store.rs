//! Host log store abstraction.
//!
//! The system collector never talks to a native log API directly. It goes
//! through this seam: a [`LogStore`] opens [`StoreClient`] connections, a
//! client issues scoped searches, and each search yields opaque
//! [`StoreRecord`]s exposing enumerable string keys with per-key lookup.
//! Any host facility that can be shaped this way (journald exports, ASL,
//! an in-memory buffer fed by the application itself) plugs in without
//! touching the collector.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

/// Errors raised by log store backends.
///
/// A [`StoreError::Connect`] during monitor construction is fatal for the
/// monitor; everything else degrades to an empty or partial scan.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The client connection could not be opened.
    #[error("failed to open log store client: {0}")]
    Connect(String),

    /// A search against an open client failed.
    #[error("log store query failed: {0}")]
    Query(String),

    /// Underlying I/O failure.
    #[error("log store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One opaque record held by the store.
pub trait StoreRecord {
    /// Keys present on this record, in the store's own order.
    fn keys(&self) -> Vec<String>;

    /// Resolve a key to its string value.
    ///
    /// Returns `None` when the key has no resolvable value; callers skip
    /// such keys and keep scanning.
    fn value(&self, key: &str) -> Option<String>;
}

/// A scoped query over the store's records.
///
/// The cursor is a scoped acquisition: dropping it releases whatever
/// native handle backs the search, regardless of how far iteration got.
pub trait RecordCursor {
    /// The next record in the store's native iteration order, or `None`
    /// when the search is exhausted.
    fn next_record(&mut self) -> Option<Box<dyn StoreRecord + '_>>;
}

/// An open connection to the host log facility.
pub trait StoreClient: Send {
    /// Issue an unfiltered search for every record the store currently
    /// holds within this client's scope.
    fn search(&mut self) -> Result<Box<dyn RecordCursor + '_>, StoreError>;
}

/// A log store backend capable of opening scoped client connections.
pub trait LogStore: Send {
    /// Open a client connection scoped to `scope` (typically the current
    /// process name).
    fn connect(&self, scope: &str) -> Result<Box<dyn StoreClient>, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store

/// An in-memory record store.
///
/// Useful when the host application feeds records to the overlay itself,
/// and as a fixture in tests. Records are served in insertion order.
///
/// The store is cheaply cloneable; clones share the same record buffer, so
/// a host can keep pushing records after handing a clone to the monitor.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use periscope::logs::MemoryStore;
///
/// let store = MemoryStore::new();
/// let mut record = BTreeMap::new();
/// record.insert("MESSAGE".to_string(), "started".to_string());
/// store.push_record(record);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<BTreeMap<String, String>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the store.
    pub fn push_record(&self, record: BTreeMap<String, String>) {
        self.records.write().push(record);
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl LogStore for MemoryStore {
    fn connect(&self, _scope: &str) -> Result<Box<dyn StoreClient>, StoreError> {
        Ok(Box::new(MemoryClient {
            records: self.records.clone(),
        }))
    }
}

struct MemoryClient {
    records: Arc<RwLock<Vec<BTreeMap<String, String>>>>,
}

impl StoreClient for MemoryClient {
    fn search(&mut self) -> Result<Box<dyn RecordCursor + '_>, StoreError> {
        // Snapshot so records pushed mid-scan don't shift the cursor
        let records = self.records.read().clone();
        Ok(Box::new(MapCursor { records, next: 0 }))
    }
}

/// Cursor over a vector of plain key/value maps.
struct MapCursor {
    records: Vec<BTreeMap<String, String>>,
    next: usize,
}

impl RecordCursor for MapCursor {
    fn next_record(&mut self) -> Option<Box<dyn StoreRecord + '_>> {
        let record = self.records.get(self.next)?;
        self.next += 1;
        Some(Box::new(MapRecord { map: record }))
    }
}

struct MapRecord<'a> {
    map: &'a BTreeMap<String, String>,
}

impl StoreRecord for MapRecord<'_> {
    fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }

    fn value(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }
}

// ---------------------------------------------------------------------------
// JSON file store

/// A store backed by a newline-delimited JSON export.
///
/// Each line is one record object, the shape produced by
/// `journalctl -o json`. Scalar fields (strings, numbers, booleans)
/// resolve to string values; nested fields have no resolvable value and
/// are skipped per key. Lines that fail to parse are skipped per record.
///
/// The file is validated at connect time and re-read on every search, so
/// a scan always reflects the export's current contents.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over the given export file.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The export file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStore for JsonFileStore {
    fn connect(&self, _scope: &str) -> Result<Box<dyn StoreClient>, StoreError> {
        if !self.path.is_file() {
            return Err(StoreError::Connect(format!(
                "no such export file: {}",
                self.path.display()
            )));
        }
        Ok(Box::new(JsonFileClient {
            path: self.path.clone(),
        }))
    }
}

struct JsonFileClient {
    path: PathBuf,
}

impl StoreClient for JsonFileClient {
    fn search(&mut self) -> Result<Box<dyn RecordCursor + '_>, StoreError> {
        let content = fs::read_to_string(&self.path)?;

        let mut records = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(line) {
                Ok(object) => records.push(flatten(object)),
                Err(e) => {
                    warn!("skipping unparsable log record: {}", e);
                }
            }
        }

        Ok(Box::new(MapCursor { records, next: 0 }))
    }
}

/// Keep scalar fields as strings; nested values are unresolvable here and
/// get dropped at key granularity.
fn flatten(object: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, String> {
    use serde_json::Value;

    let mut map = BTreeMap::new();
    for (key, value) in object {
        let resolved = match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        };
        if let Some(resolved) = resolved {
            map.insert(key, resolved);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn drain(cursor: &mut dyn RecordCursor) -> Vec<BTreeMap<String, String>> {
        let mut out = Vec::new();
        while let Some(rec) = cursor.next_record() {
            let mut map = BTreeMap::new();
            for key in rec.keys() {
                if let Some(value) = rec.value(&key) {
                    map.insert(key, value);
                }
            }
            out.push(map);
        }
        out
    }

    #[test]
    fn memory_store_serves_records_in_insertion_order() {
        let store = MemoryStore::new();
        store.push_record(record(&[("MESSAGE", "first")]));
        store.push_record(record(&[("MESSAGE", "second")]));

        let mut client = store.connect("test").unwrap();
        let mut cursor = client.search().unwrap();
        let records = drain(cursor.as_mut());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("MESSAGE").unwrap(), "first");
        assert_eq!(records[1].get("MESSAGE").unwrap(), "second");
    }

    #[test]
    fn memory_store_clones_share_records() {
        let store = MemoryStore::new();
        let handle = store.clone();
        handle.push_record(record(&[("MESSAGE", "shared")]));

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_search_snapshot_ignores_mid_scan_pushes() {
        let store = MemoryStore::new();
        store.push_record(record(&[("MESSAGE", "first")]));

        let mut client = store.connect("test").unwrap();
        let mut cursor = client.search().unwrap();
        store.push_record(record(&[("MESSAGE", "late")]));

        let records = drain(cursor.as_mut());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_memory_store_yields_no_records() {
        let store = MemoryStore::new();
        let mut client = store.connect("test").unwrap();
        let mut cursor = client.search().unwrap();
        assert!(cursor.next_record().is_none());
    }

    #[test]
    fn json_store_connect_fails_for_missing_file() {
        let store = JsonFileStore::new("/nonexistent/export.json");
        let err = store.connect("test").err().unwrap();
        assert!(matches!(err, StoreError::Connect(_)));
    }

    #[test]
    fn json_store_parses_scalar_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"MESSAGE":"boot","PRIORITY":6,"_TRANSPORT":"journal","SEALED":false}}"#
        )
        .unwrap();

        let store = JsonFileStore::new(file.path());
        let mut client = store.connect("test").unwrap();
        let mut cursor = client.search().unwrap();
        let records = drain(cursor.as_mut());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("MESSAGE").unwrap(), "boot");
        assert_eq!(records[0].get("PRIORITY").unwrap(), "6");
        assert_eq!(records[0].get("SEALED").unwrap(), "false");
    }

    #[test]
    fn json_store_skips_unresolvable_values_per_key() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"MESSAGE":"kept","BLOB":[1,2,3],"META":{{"nested":true}},"GONE":null}}"#
        )
        .unwrap();

        let store = JsonFileStore::new(file.path());
        let mut client = store.connect("test").unwrap();
        let mut cursor = client.search().unwrap();
        let records = drain(cursor.as_mut());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 1);
        assert!(records[0].contains_key("MESSAGE"));
    }

    #[test]
    fn json_store_skips_unparsable_lines_per_record() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"MESSAGE":"one"}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file, r#"{{"MESSAGE":"two"}}"#).unwrap();

        let store = JsonFileStore::new(file.path());
        let mut client = store.connect("test").unwrap();
        let mut cursor = client.search().unwrap();
        let records = drain(cursor.as_mut());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("MESSAGE").unwrap(), "one");
        assert_eq!(records[1].get("MESSAGE").unwrap(), "two");
    }

    #[test]
    fn json_store_rereads_file_per_search() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"MESSAGE":"one"}}"#).unwrap();
        file.flush().unwrap();

        let store = JsonFileStore::new(file.path());
        let mut client = store.connect("test").unwrap();

        {
            let mut cursor = client.search().unwrap();
            assert_eq!(drain(cursor.as_mut()).len(), 1);
        }

        writeln!(file, r#"{{"MESSAGE":"two"}}"#).unwrap();
        file.flush().unwrap();

        let mut cursor = client.search().unwrap();
        assert_eq!(drain(cursor.as_mut()).len(), 2);
    }
}

//! On-demand system log scans.
//!
//! [`SystemLogsMonitor`] queries the host's log facility through the
//! [`LogStore`](super::store::LogStore) seam and delivers the normalized
//! result as a single batch per scan.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::entry::LogEntry;
use super::store::{LogStore, StoreClient, StoreError};
use super::LogsMonitor;
use crate::observer::{Observer, Observers, TelemetryEvent};

/// Scans the host system log store for this process's records.
///
/// The client connection is opened once when the monitor is created and
/// released when the monitor is dropped; each
/// [`subscribe`](LogsMonitor::subscribe) call issues one scoped query.
/// The delivered batch is ordered newest first: records are front-inserted
/// as they are consumed, so the sequence is the exact reversal of the
/// store's native iteration order.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use periscope::logs::{LogsMonitor, MemoryStore, SystemLogsMonitor};
///
/// let store = MemoryStore::new();
/// let mut record = BTreeMap::new();
/// record.insert("MESSAGE".to_string(), "booted".to_string());
/// store.push_record(record);
///
/// let mut monitor = SystemLogsMonitor::open(&store).unwrap();
/// monitor.subscribe();
/// assert_eq!(monitor.entries().len(), 1);
/// ```
pub struct SystemLogsMonitor {
    client: Box<dyn StoreClient>,
    last_scan: Mutex<Vec<LogEntry>>,
    observers: Observers,
}

impl SystemLogsMonitor {
    /// Open a monitor scoped to the current process name.
    ///
    /// Failing to open the store client is the one fatal error here: a
    /// monitor without a connection could never produce anything.
    pub fn open(store: &dyn LogStore) -> Result<Self, StoreError> {
        Self::open_scoped(store, &process_name())
    }

    /// Open a monitor with an explicit scope.
    pub fn open_scoped(store: &dyn LogStore, scope: &str) -> Result<Self, StoreError> {
        let client = store.connect(scope)?;
        Ok(Self {
            client,
            last_scan: Mutex::new(Vec::new()),
            observers: Observers::new(),
        })
    }

    /// The result of the most recent scan, newest first. Empty before the
    /// first subscribe.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.last_scan.lock().clone()
    }

    /// Run one scan and return the normalized batch, newest first.
    fn scan(&mut self) -> Vec<LogEntry> {
        let mut scanned = Vec::new();

        // The cursor is dropped at the end of this block, releasing the
        // scoped query handle no matter how the scan went.
        match self.client.search() {
            Ok(mut cursor) => {
                while let Some(record) = cursor.next_record() {
                    let mut raw = BTreeMap::new();
                    for key in record.keys() {
                        // Keys with no resolvable value are skipped, not fatal
                        if let Some(value) = record.value(&key) {
                            raw.insert(key, value);
                        }
                    }
                    scanned.push(LogEntry::new(raw));
                }
            }
            Err(e) => {
                warn!("system log search failed, delivering empty batch: {}", e);
            }
        }

        // Newest-first contract: reverse of native iteration order
        scanned.reverse();
        debug!("system log scan produced {} entries", scanned.len());
        scanned
    }
}

impl LogsMonitor for SystemLogsMonitor {
    /// Perform a one-shot scan and deliver the whole result in a single
    /// notification.
    ///
    /// An empty store, or one holding no records for this process, yields
    /// an empty batch rather than an error.
    fn subscribe(&mut self) {
        let scanned = self.scan();
        *self.last_scan.lock() = scanned.clone();
        self.observers.emit(&TelemetryEvent::SystemLogs(scanned));
    }

    fn register_observer(&self, observer: Arc<dyn Observer>) {
        self.observers.register(observer);
    }
}

impl std::fmt::Debug for SystemLogsMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemLogsMonitor")
            .field("last_scan", &self.last_scan.lock().len())
            .finish()
    }
}

/// Name of the current executable, used as the default query scope.
fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_default()
}

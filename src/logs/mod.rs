//! Log capture: normalized entries and the two collectors.
//!
//! Two collectors share one capability contract, [`LogsMonitor`]:
//!
//! - [`ConsoleLogsMonitor`] observes the process's own diagnostic stream
//!   continuously and delivers incrementally (the full sequence so far,
//!   once per new line).
//! - [`SystemLogsMonitor`] queries the host's system log store on demand
//!   and delivers one batch per scan, newest first.
//!
//! Both normalize whatever their backend produces into [`LogEntry`]
//! values. The contract itself carries no discriminant; a consumer
//! multiplexing several monitors tells callbacks apart by which instance
//! it registered with.

mod console;
mod entry;
mod store;
mod system;

pub use console::ConsoleLogsMonitor;
pub use entry::{keys, LogEntry};
pub use store::{
    JsonFileStore, LogStore, MemoryStore, RecordCursor, StoreClient, StoreError, StoreRecord,
};
pub use system::SystemLogsMonitor;

use std::sync::Arc;

use crate::observer::Observer;

/// Capability shared by both log collectors.
pub trait LogsMonitor {
    /// Trigger collection.
    ///
    /// Continuous for the console collector (begins observation), one-shot
    /// for the system collector (runs a scan). Fire-and-forget: results
    /// arrive through registered observers.
    fn subscribe(&mut self);

    /// Attach an observer that receives this monitor's log payloads.
    fn register_observer(&self, observer: Arc<dyn Observer>);
}

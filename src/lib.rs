//! # periscope
//!
//! An in-process diagnostic overlay core: captures HTTP traffic, console
//! log output, and host system logs from a running application and pushes
//! the normalized results to registered observers, without restarting the
//! process or attaching an external debugger.
//!
//! This crate is the capture and correlation layer only. Rendering,
//! operator interaction, and the interception mechanism itself (stdout
//! piping, URL-loading hooks) belong to the host; the overlay consumes
//! events and streams the host delivers and exposes what it collects.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Host application                       │
//! │  instrumentation hooks        stdout pipe      log facility  │
//! │        │                          │                 │        │
//! │        ▼                          ▼                 ▼        │
//! │  ┌───────────────┐   ┌───────────────────┐  ┌──────────────┐ │
//! │  │ NetworkMonitor│   │ ConsoleLogsMonitor│  │ SystemLogs   │ │
//! │  │ (correlation) │   │ (live stream)     │  │ Monitor      │ │
//! │  └───────┬───────┘   └─────────┬─────────┘  └──────┬───────┘ │
//! │          └──────────────┬──────┴────────────┬──────┘         │
//! │                         ▼  TelemetryEvent   ▼                │
//! │                 ┌──────────────────────────────┐             │
//! │                 │  Observers (presentation)    │             │
//! │                 └──────────────────────────────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`network`]**: folds independently arriving request/response/error
//!   events into per-transaction [`TrafficEntry`] records
//! - **[`logs`]**: the [`LogEntry`] model, the continuous console
//!   collector, the one-shot system collector, and the [`LogStore`] seam
//!   over host log facilities
//! - **[`observer`]**: the outbound contract, [`TelemetryEvent`]s pushed
//!   to registered [`Observer`]s
//! - **[`config`]**: feature toggles consumed from the host
//! - **[`overlay`]**: one explicitly owned [`Overlay`] wiring the monitors
//!   for a single session
//!
//! ## Correlating network traffic
//!
//! ```
//! use periscope::network::{NetworkMonitor, Request, Response, TransportError};
//!
//! let monitor = NetworkMonitor::new();
//! monitor.record_request(Request::new("tx-1", "GET", "https://api.example.com/a"));
//! monitor.record_request(Request::new("tx-2", "GET", "https://api.example.com/b"));
//! monitor.record_response(Response::new("tx-1", 200, "https://api.example.com/a"));
//! monitor.record_error(TransportError::new("tx-2", "dns", -2, "no such host"));
//!
//! let entries = monitor.entries();
//! assert!(entries[0].response().is_some());
//! assert!(entries[1].error().is_some());
//! ```
//!
//! ## Scanning system logs
//!
//! ```
//! use std::collections::BTreeMap;
//! use periscope::logs::{LogsMonitor, MemoryStore, SystemLogsMonitor};
//!
//! let store = MemoryStore::new();
//! let mut record = BTreeMap::new();
//! record.insert("MESSAGE".to_string(), "service started".to_string());
//! store.push_record(record);
//!
//! let mut monitor = SystemLogsMonitor::open(&store)?;
//! monitor.subscribe();
//! assert_eq!(monitor.entries()[0].message(), "service started");
//! # Ok::<(), periscope::logs::StoreError>(())
//! ```
//!
//! ## Wiring a session
//!
//! ```no_run
//! use periscope::{Overlay, OverlayConfig};
//! use periscope::logs::JsonFileStore;
//! use periscope::observer::ChannelObserver;
//!
//! # tokio_test::block_on(async {
//! let (observer, mut events) = ChannelObserver::channel(64);
//! let (console_tx, console_rx) = tokio::sync::mpsc::channel(64);
//!
//! let mut overlay = Overlay::builder()
//!     .config(OverlayConfig::default())
//!     .console_lines(console_rx)
//!     .log_store(Box::new(JsonFileStore::new("/var/log/app/export.json")))
//!     .observer(observer)
//!     .build()
//!     .expect("log store unreachable");
//!
//! overlay.start();
//! let network = overlay.network().unwrap();
//! // hand `network` and `console_tx` to the instrumentation hooks,
//! // consume `events` from the presentation layer
//! # });
//! ```

pub mod config;
pub mod logs;
pub mod network;
pub mod observer;
pub mod overlay;

// Re-export the main types for convenience
pub use config::{FeatureToggles, OverlayConfig};
pub use logs::{ConsoleLogsMonitor, LogEntry, LogStore, LogsMonitor, SystemLogsMonitor};
pub use network::{NetworkMonitor, Request, Response, TrafficEntry, TransportError};
pub use observer::{FeatureKind, Observer, TelemetryEvent};
pub use overlay::Overlay;

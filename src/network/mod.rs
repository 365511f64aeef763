//! HTTP traffic capture and correlation.
//!
//! The [`NetworkMonitor`] receives request, response, and error events
//! from instrumentation hooks (the hooking mechanism itself lives in the
//! host) and folds them into per-transaction [`TrafficEntry`] records.

mod entry;
mod monitor;

pub use entry::{Request, Response, TrafficEntry, TransportError};
pub use monitor::NetworkMonitor;

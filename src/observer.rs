//! Observer contract for pushing captured telemetry to a presentation layer.
//!
//! Monitors do not render anything themselves; they push
//! [`TelemetryEvent`]s to whichever observers the host registered. A
//! monitor holds a registry of observer handles rather than a single
//! delegate, so one presentation layer, many, or none at all can consume
//! the same session.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::logs::LogEntry;

/// The telemetry feature a notification originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Correlated HTTP transactions.
    Network,
    /// Live console output.
    ConsoleLogs,
    /// On-demand system log scans.
    SystemLogs,
}

/// A single notification pushed to registered observers.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// The traffic collection changed; read a fresh snapshot from the
    /// network monitor. Fired once per request, response, and error event.
    Network,
    /// The full console log sequence observed so far, oldest first.
    ConsoleLogs(Vec<LogEntry>),
    /// The result of one system log scan, newest first.
    SystemLogs(Vec<LogEntry>),
}

impl TelemetryEvent {
    /// The feature this event belongs to.
    pub fn kind(&self) -> FeatureKind {
        match self {
            TelemetryEvent::Network => FeatureKind::Network,
            TelemetryEvent::ConsoleLogs(_) => FeatureKind::ConsoleLogs,
            TelemetryEvent::SystemLogs(_) => FeatureKind::SystemLogs,
        }
    }
}

/// Receives telemetry notifications.
///
/// Notifications are delivered synchronously on whatever thread or task
/// produced the event, so implementations should hand work off quickly
/// (see [`ChannelObserver`] for the common forwarding case).
pub trait Observer: Send + Sync {
    /// Called once per captured event.
    fn notify(&self, event: &TelemetryEvent);
}

/// Registry of observers shared by a monitor.
#[derive(Default)]
pub struct Observers {
    inner: RwLock<Vec<Arc<dyn Observer>>>,
}

impl Observers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer. Observers cannot be removed for the lifetime of
    /// the monitoring session.
    pub fn register(&self, observer: Arc<dyn Observer>) {
        self.inner.write().push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True when no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Deliver an event to every registered observer, in registration
    /// order.
    pub(crate) fn emit(&self, event: &TelemetryEvent) {
        for observer in self.inner.read().iter() {
            observer.notify(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.len()).finish()
    }
}

/// Observer that forwards events into a bounded tokio channel.
///
/// Sending is best effort: if the receiver has fallen behind and the
/// channel is full, the event is dropped rather than blocking the
/// capture path.
///
/// # Example
///
/// ```
/// use periscope::observer::ChannelObserver;
/// use periscope::NetworkMonitor;
///
/// let (observer, mut rx) = ChannelObserver::channel(16);
/// let monitor = NetworkMonitor::new();
/// monitor.register_observer(observer);
/// ```
pub struct ChannelObserver {
    tx: mpsc::Sender<TelemetryEvent>,
}

impl ChannelObserver {
    /// Create an observer/receiver pair backed by a channel of the given
    /// capacity.
    pub fn channel(buffer: usize) -> (Arc<Self>, mpsc::Receiver<TelemetryEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Arc::new(Self { tx }), rx)
    }
}

impl Observer for ChannelObserver {
    fn notify(&self, event: &TelemetryEvent) {
        let _ = self.tx.try_send(event.clone());
    }
}

impl fmt::Debug for ChannelObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelObserver").finish()
    }
}

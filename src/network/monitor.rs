//! HTTP transaction correlation.
//!
//! Instrumentation hooks deliver request, response, and error events
//! independently, possibly from different threads, each tagged with a
//! transaction identifier. [`NetworkMonitor`] folds them into one ordered,
//! identifier-addressable collection of [`TrafficEntry`] records and tells
//! observers every time the collection changes.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::entry::{Request, Response, TrafficEntry, TransportError};
use crate::observer::{Observer, Observers, TelemetryEvent};

/// Correlates independently arriving HTTP transaction events.
///
/// Construct one per monitoring session and hand clones of the `Arc` to
/// whichever instrumentation hooks produce events; the internal mutex
/// serializes concurrent deliveries. Entries accumulate for the session's
/// lifetime; nothing is evicted except through [`clear`](Self::clear).
///
/// # Example
///
/// ```
/// use periscope::network::{NetworkMonitor, Request, Response};
///
/// let monitor = NetworkMonitor::new();
/// monitor.record_request(Request::new("tx-1", "GET", "https://api.example.com"));
/// monitor.record_response(Response::new("tx-1", 200, "https://api.example.com"));
///
/// let entries = monitor.entries();
/// assert_eq!(entries[0].response().unwrap().status_code, 200);
/// ```
#[derive(Debug, Default)]
pub struct NetworkMonitor {
    entries: Mutex<Vec<TrafficEntry>>,
    observers: Observers,
}

impl NetworkMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer notified once per recorded event.
    ///
    /// Notifications fire after the mutation's critical section, so an
    /// observer may read [`entries`](Self::entries) from its callback.
    pub fn register_observer(&self, observer: Arc<dyn Observer>) {
        self.observers.register(observer);
    }

    /// Record an observed request.
    ///
    /// Always succeeds: a new pending entry is appended at the tail, so
    /// collection order is the order requests were observed.
    pub fn record_request(&self, request: Request) {
        self.entries.lock().push(TrafficEntry::new(request));
        self.observers.emit(&TelemetryEvent::Network);
    }

    /// Record a response for an earlier request.
    ///
    /// The earliest entry whose identifier matches wins (first match by
    /// forward scan). A response with no matching request is dropped
    /// silently; observers are notified either way.
    pub fn record_response(&self, response: Response) {
        {
            let mut entries = self.entries.lock();
            match entries
                .iter_mut()
                .find(|entry| entry.identifier() == response.request_identifier)
            {
                Some(entry) => entry.set_response(response),
                None => {
                    debug!(
                        "dropping response for unknown transaction {}",
                        response.request_identifier
                    );
                }
            }
        }
        self.observers.emit(&TelemetryEvent::Network);
    }

    /// Record a transport error for an earlier request.
    ///
    /// Same lookup and notification semantics as
    /// [`record_response`](Self::record_response).
    pub fn record_error(&self, error: TransportError) {
        {
            let mut entries = self.entries.lock();
            match entries
                .iter_mut()
                .find(|entry| entry.identifier() == error.request_identifier)
            {
                Some(entry) => entry.set_error(error),
                None => {
                    debug!(
                        "dropping error for unknown transaction {}",
                        error.request_identifier
                    );
                }
            }
        }
        self.observers.emit(&TelemetryEvent::Network);
    }

    /// Snapshot of the collection in request-arrival order.
    pub fn entries(&self) -> Vec<TrafficEntry> {
        self.entries.lock().clone()
    }

    /// Number of transactions recorded so far.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no transaction has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every recorded transaction (operator-triggered).
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.observers.emit(&TelemetryEvent::Network);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::FeatureKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts notifications, asserting every one is a network event.
    #[derive(Default)]
    struct Counting {
        count: AtomicUsize,
    }

    impl Observer for Counting {
        fn notify(&self, event: &TelemetryEvent) {
            assert_eq!(event.kind(), FeatureKind::Network);
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request(id: &str) -> Request {
        Request::new(id, "GET", format!("https://api.example.com/{id}"))
    }

    #[test]
    fn requests_append_in_observed_order() {
        let monitor = NetworkMonitor::new();
        monitor.record_request(request("b"));
        monitor.record_request(request("a"));
        monitor.record_request(request("c"));

        let entries = monitor.entries();
        assert_eq!(entries.len(), 3);
        let ids: Vec<&str> = entries.iter().map(|e| e.identifier()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn response_lands_on_the_matching_entry_only() {
        let monitor = NetworkMonitor::new();
        monitor.record_request(request("1"));
        monitor.record_request(request("2"));

        let response = Response::new("1", 200, "https://api.example.com/1");
        monitor.record_response(response.clone());

        let entries = monitor.entries();
        assert_eq!(entries[0].response(), Some(&response));
        assert!(entries[1].response().is_none());
        assert!(entries[1].error().is_none());
    }

    #[test]
    fn unmatched_terminal_events_leave_the_collection_unchanged() {
        let monitor = NetworkMonitor::new();
        monitor.record_request(request("1"));
        let before = monitor.entries();

        monitor.record_response(Response::new("ghost", 200, "https://api.example.com"));
        monitor.record_error(TransportError::new("ghost", "dns", -1, "no such host"));

        assert_eq!(monitor.entries(), before);
    }

    #[test]
    fn unmatched_events_still_notify() {
        let monitor = NetworkMonitor::new();
        let observer = Arc::new(Counting::default());
        monitor.register_observer(observer.clone());

        monitor.record_response(Response::new("ghost", 200, "https://api.example.com"));

        assert_eq!(observer.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_response_overwrites() {
        let monitor = NetworkMonitor::new();
        monitor.record_request(request("1"));
        monitor.record_response(Response::new("1", 500, "https://api.example.com/1"));
        monitor.record_response(Response::new("1", 200, "https://api.example.com/1"));

        let entries = monitor.entries();
        assert_eq!(entries[0].response().unwrap().status_code, 200);
    }

    #[test]
    fn forward_scan_picks_the_earliest_duplicate_request() {
        // Duplicate identifiers shouldn't happen under correct
        // instrumentation, but the lookup must stay deterministic
        let monitor = NetworkMonitor::new();
        monitor.record_request(request("dup"));
        monitor.record_request(request("dup"));

        monitor.record_response(Response::new("dup", 204, "https://api.example.com/dup"));

        let entries = monitor.entries();
        assert!(entries[0].response().is_some());
        assert!(entries[1].response().is_none());
    }

    #[test]
    fn one_notification_per_event() {
        let monitor = NetworkMonitor::new();
        let observer = Arc::new(Counting::default());
        monitor.register_observer(observer.clone());

        monitor.record_request(request("1"));
        monitor.record_request(request("2"));
        monitor.record_response(Response::new("1", 200, "https://api.example.com/1"));
        monitor.record_error(TransportError::new("2", "tls", -9806, "handshake failed"));

        assert_eq!(observer.count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn observer_may_read_entries_from_the_callback() {
        struct Reading {
            monitor: Arc<NetworkMonitor>,
            seen: AtomicUsize,
        }

        impl Observer for Reading {
            fn notify(&self, _event: &TelemetryEvent) {
                self.seen.store(self.monitor.len(), Ordering::SeqCst);
            }
        }

        let monitor = Arc::new(NetworkMonitor::new());
        let observer = Arc::new(Reading {
            monitor: monitor.clone(),
            seen: AtomicUsize::new(0),
        });
        monitor.register_observer(observer.clone());

        monitor.record_request(request("1"));

        assert_eq!(observer.seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_empties_and_notifies() {
        let monitor = NetworkMonitor::new();
        monitor.record_request(request("1"));

        let observer = Arc::new(Counting::default());
        monitor.register_observer(observer.clone());
        monitor.clear();

        assert!(monitor.is_empty());
        assert_eq!(observer.count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_deliveries_are_serialized() {
        use std::thread;

        let monitor = Arc::new(NetworkMonitor::new());

        let mut handles = Vec::new();
        for batch in 0..4 {
            let m = monitor.clone();
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("tx-{batch}-{i}");
                    m.record_request(Request::new(&id, "GET", "https://api.example.com"));
                    m.record_response(Response::new(&id, 200, "https://api.example.com"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = monitor.entries();
        assert_eq!(entries.len(), 200);
        assert!(entries.iter().all(|e| e.response().is_some()));
    }
}

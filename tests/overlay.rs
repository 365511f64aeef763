//! End-to-end tests exercising a full monitoring session.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use periscope::logs::MemoryStore;
use periscope::network::{Request, Response, TransportError};
use periscope::observer::ChannelObserver;
use periscope::{FeatureKind, Observer, Overlay, OverlayConfig, TelemetryEvent};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Records the kind of every event it sees.
#[derive(Default)]
struct KindLog {
    kinds: Mutex<Vec<FeatureKind>>,
}

impl Observer for KindLog {
    fn notify(&self, event: &TelemetryEvent) {
        self.kinds.lock().push(event.kind());
    }
}

#[test]
fn end_to_end_correlation_scenario() {
    init_tracing();
    let observer = Arc::new(KindLog::default());
    let overlay = Overlay::builder()
        .config(OverlayConfig::default())
        .observer(observer.clone())
        .build()
        .unwrap();

    let network = overlay.network().unwrap();
    network.record_request(Request::new("1", "GET", "https://api.example.com/one"));
    network.record_request(Request::new("2", "GET", "https://api.example.com/two"));
    network.record_response(Response::new("1", 200, "https://api.example.com/one"));
    network.record_error(TransportError::new("2", "timeout", -1001, "request timed out"));

    // Four events, each notified once with kind network
    assert_eq!(*observer.kinds.lock(), vec![FeatureKind::Network; 4]);

    let entries = network.entries();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].identifier(), "1");
    assert_eq!(entries[0].response().unwrap().status_code, 200);
    assert!(entries[0].error().is_none());

    assert_eq!(entries[1].identifier(), "2");
    assert!(entries[1].response().is_none());
    assert_eq!(entries[1].error().unwrap().code, -1001);
}

#[tokio::test]
async fn console_and_system_logs_flow_through_one_session() {
    init_tracing();
    let store = MemoryStore::new();
    let mut record = BTreeMap::new();
    record.insert("MESSAGE".to_string(), "kernel: link up".to_string());
    store.push_record(record);

    let (observer, mut events) = ChannelObserver::channel(64);
    let (console_tx, console_rx) = tokio::sync::mpsc::channel(16);

    let mut overlay = Overlay::builder()
        .config(OverlayConfig::default())
        .console_lines(console_rx)
        .log_store(Box::new(store))
        .observer(observer)
        .build()
        .unwrap();

    overlay.start();
    console_tx.send("request accepted".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;

    overlay.scan_system_logs();

    let console_event = events.recv().await.unwrap();
    match console_event {
        TelemetryEvent::ConsoleLogs(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].message(), "request accepted");
        }
        other => panic!("expected console logs, got {:?}", other.kind()),
    }

    let system_event = events.recv().await.unwrap();
    match system_event {
        TelemetryEvent::SystemLogs(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].message(), "kernel: link up");
        }
        other => panic!("expected system logs, got {:?}", other.kind()),
    }

    // Console state survives across the whole session
    assert_eq!(overlay.console().unwrap().entries().len(), 1);
    assert_eq!(overlay.system().unwrap().entries().len(), 1);
}

#[tokio::test]
async fn observers_see_every_feature_of_a_session() {
    init_tracing();
    let observer = Arc::new(KindLog::default());
    let (console_tx, console_rx) = tokio::sync::mpsc::channel(16);

    let mut overlay = Overlay::builder()
        .console_lines(console_rx)
        .log_store(Box::new(MemoryStore::new()))
        .observer(observer.clone())
        .build()
        .unwrap();

    overlay.start();
    overlay
        .network()
        .unwrap()
        .record_request(Request::new("tx", "GET", "https://api.example.com"));
    console_tx.send("one line".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    overlay.scan_system_logs();

    let kinds = observer.kinds.lock().clone();
    assert!(kinds.contains(&FeatureKind::Network));
    assert!(kinds.contains(&FeatureKind::ConsoleLogs));
    assert!(kinds.contains(&FeatureKind::SystemLogs));
}

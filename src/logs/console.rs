//! Live console output capture.
//!
//! [`ConsoleLogsMonitor`] continuously observes the process's own textual
//! diagnostic stream and turns every line into a [`LogEntry`] the moment
//! it appears. How the stream is obtained is the host's business (commonly
//! the read end of a pipe dup'd over stdout); the monitor just consumes an
//! async reader or a line channel.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::entry::LogEntry;
use super::LogsMonitor;
use crate::observer::{Observer, Observers, TelemetryEvent};

/// Where captured lines come from.
enum LineSource {
    /// An async byte stream, split on newlines.
    Reader(Box<dyn AsyncRead + Unpin + Send>),
    /// Pre-split lines pushed by the host.
    Lines(mpsc::Receiver<String>),
}

struct ConsoleState {
    entries: Vec<LogEntry>,
    /// When false, lines are still captured but no notification fires.
    delivering: bool,
}

struct ConsoleShared {
    state: Mutex<ConsoleState>,
    observers: Observers,
}

impl ConsoleShared {
    /// Append one line and, while delivery is enabled, resend the full
    /// sequence observed so far. The append and the notification share one
    /// critical section so delivery order equals observation order and the
    /// unsubscribe boundary is exact; observers must not call back into
    /// this monitor.
    fn ingest(&self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return;
        }

        let entry = LogEntry::from_line(line, Utc::now());
        let mut state = self.state.lock();
        state.entries.push(entry);
        if state.delivering {
            self.observers
                .emit(&TelemetryEvent::ConsoleLogs(state.entries.clone()));
        }
    }
}

/// Continuously captures the process's console output as [`LogEntry`]s.
///
/// Delivery is incremental accumulate-and-resend: each observed line
/// produces one notification carrying every line captured so far, oldest
/// first. Captured state persists for the monitor's lifetime; disabling
/// delivery with [`unsubscribe`](ConsoleLogsMonitor::unsubscribe) loses
/// nothing.
///
/// # Example
///
/// ```
/// use periscope::logs::{ConsoleLogsMonitor, LogsMonitor};
///
/// # tokio_test::block_on(async {
/// let (lines, mut monitor) = ConsoleLogsMonitor::channel(16);
/// monitor.subscribe();
///
/// lines.send("listening on :8080".to_string()).await.unwrap();
/// # });
/// ```
pub struct ConsoleLogsMonitor {
    shared: Arc<ConsoleShared>,
    /// Handed to the reader task on the first subscribe.
    source: Option<LineSource>,
    reader: Option<tokio::task::JoinHandle<()>>,
}

impl ConsoleLogsMonitor {
    fn new(source: LineSource) -> Self {
        Self {
            shared: Arc::new(ConsoleShared {
                state: Mutex::new(ConsoleState {
                    entries: Vec::new(),
                    delivering: false,
                }),
                observers: Observers::new(),
            }),
            source: Some(source),
            reader: None,
        }
    }

    /// Observe an async byte stream, one entry per line.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::new(LineSource::Reader(Box::new(reader)))
    }

    /// Observe lines pushed through a channel.
    pub fn from_lines(lines: mpsc::Receiver<String>) -> Self {
        Self::new(LineSource::Lines(lines))
    }

    /// Create a sender/monitor pair for push-style hosts.
    pub fn channel(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::from_lines(rx))
    }

    /// Stop delivering notifications.
    ///
    /// Once this returns, no further notification fires. Observation
    /// itself continues: lines arriving while delivery is disabled are
    /// still captured and appear in the payload after a re-subscribe.
    pub fn unsubscribe(&mut self) {
        self.shared.state.lock().delivering = false;
    }

    /// Every line captured so far, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.shared.state.lock().entries.clone()
    }

    fn spawn_reader(&mut self) {
        let Some(source) = self.source.take() else {
            return;
        };
        let shared = self.shared.clone();

        let handle = tokio::spawn(async move {
            match source {
                LineSource::Reader(reader) => {
                    let mut reader = BufReader::new(reader);
                    let mut line = String::new();
                    loop {
                        line.clear();
                        match reader.read_line(&mut line).await {
                            Ok(0) => {
                                debug!("console stream reached EOF");
                                break;
                            }
                            Ok(_) => shared.ingest(&line),
                            Err(e) => {
                                debug!("console stream read error: {}", e);
                                break;
                            }
                        }
                    }
                }
                LineSource::Lines(mut rx) => {
                    while let Some(line) = rx.recv().await {
                        shared.ingest(&line);
                    }
                }
            }
        });

        self.reader = Some(handle);
    }
}

impl LogsMonitor for ConsoleLogsMonitor {
    /// Begin (or resume) observation.
    ///
    /// The first call spawns the background reader and must happen within
    /// a tokio runtime; later calls just re-enable delivery.
    fn subscribe(&mut self) {
        self.shared.state.lock().delivering = true;
        self.spawn_reader();
    }

    fn register_observer(&self, observer: Arc<dyn Observer>) {
        self.shared.observers.register(observer);
    }
}

impl std::fmt::Debug for ConsoleLogsMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleLogsMonitor")
            .field("captured", &self.shared.state.lock().entries.len())
            .field("observing", &self.reader.is_some())
            .finish()
    }
}

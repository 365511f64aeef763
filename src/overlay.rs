//! Session wiring for the diagnostic overlay.
//!
//! An [`Overlay`] owns one correlation table and one of each log collector
//! for a single monitoring session. There is deliberately no process-wide
//! instance: the host constructs an overlay, hands the network monitor to
//! its instrumentation hooks, and drops the whole thing when the session
//! ends.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::OverlayConfig;
use crate::logs::{ConsoleLogsMonitor, LogStore, LogsMonitor, SystemLogsMonitor};
use crate::network::NetworkMonitor;
use crate::observer::{FeatureKind, Observer};

/// One monitoring session: the correlation layer plus both log collectors,
/// built from the host's configuration.
///
/// Monitors exist only for features the host enabled and supplied inputs
/// for. The network monitor is shared as an `Arc` so instrumentation can
/// push events from arbitrary threads.
///
/// # Example
///
/// ```
/// use periscope::{Overlay, OverlayConfig};
/// use periscope::logs::MemoryStore;
///
/// # tokio_test::block_on(async {
/// let (console_lines, mut overlay) = {
///     let (tx, rx) = tokio::sync::mpsc::channel(16);
///     let overlay = Overlay::builder()
///         .config(OverlayConfig::default())
///         .console_lines(rx)
///         .log_store(Box::new(MemoryStore::new()))
///         .build()
///         .unwrap();
///     (tx, overlay)
/// };
///
/// overlay.start();
/// let network = overlay.network().unwrap();
/// # drop(console_lines);
/// # drop(network);
/// # });
/// ```
pub struct Overlay {
    config: OverlayConfig,
    network: Option<Arc<NetworkMonitor>>,
    console: Option<ConsoleLogsMonitor>,
    system: Option<SystemLogsMonitor>,
}

impl Overlay {
    /// Start building an overlay.
    pub fn builder() -> OverlayBuilder {
        OverlayBuilder::default()
    }

    /// The configuration this session was built from.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Begin continuous console capture.
    ///
    /// Must be called within a tokio runtime. A no-op when console capture
    /// is disabled or no stream was supplied.
    pub fn start(&mut self) {
        if let Some(console) = self.console.as_mut() {
            console.subscribe();
            info!("console log capture started");
        }
    }

    /// Run one on-demand system log scan, delivering a batch to observers.
    ///
    /// A no-op when system log capture is disabled or no store was
    /// supplied.
    pub fn scan_system_logs(&mut self) {
        if let Some(system) = self.system.as_mut() {
            system.subscribe();
        }
    }

    /// Shared handle to the correlation layer, when enabled.
    pub fn network(&self) -> Option<Arc<NetworkMonitor>> {
        self.network.clone()
    }

    /// The console collector, when enabled and supplied with a stream.
    pub fn console(&self) -> Option<&ConsoleLogsMonitor> {
        self.console.as_ref()
    }

    /// The console collector, mutably (for unsubscribe).
    pub fn console_mut(&mut self) -> Option<&mut ConsoleLogsMonitor> {
        self.console.as_mut()
    }

    /// The system collector, when enabled and supplied with a store.
    pub fn system(&self) -> Option<&SystemLogsMonitor> {
        self.system.as_ref()
    }
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay")
            .field("network", &self.network.is_some())
            .field("console", &self.console.is_some())
            .field("system", &self.system.is_some())
            .finish()
    }
}

/// Builder for [`Overlay`].
#[derive(Default)]
pub struct OverlayBuilder {
    config: OverlayConfig,
    console: Option<ConsoleLogsMonitor>,
    store: Option<Box<dyn LogStore>>,
    observers: Vec<Arc<dyn Observer>>,
}

impl OverlayBuilder {
    /// Use the given configuration (defaults enable every feature).
    pub fn config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    /// Capture console output from an async byte stream.
    pub fn console_reader<R>(mut self, reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.console = Some(ConsoleLogsMonitor::from_reader(reader));
        self
    }

    /// Capture console output from a channel of pre-split lines.
    pub fn console_lines(mut self, lines: mpsc::Receiver<String>) -> Self {
        self.console = Some(ConsoleLogsMonitor::from_lines(lines));
        self
    }

    /// Query system logs from the given store.
    pub fn log_store(mut self, store: Box<dyn LogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register an observer on every monitor the overlay ends up with.
    /// May be called multiple times.
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the overlay.
    ///
    /// The only failure is a system log store whose client connection
    /// cannot be opened; every other combination of missing inputs just
    /// leaves the corresponding monitor out.
    pub fn build(self) -> Result<Overlay> {
        let features = self.config.features;

        let network = features.is_enabled(FeatureKind::Network).then(|| {
            let monitor = Arc::new(NetworkMonitor::new());
            for observer in &self.observers {
                monitor.register_observer(observer.clone());
            }
            monitor
        });

        let console = if features.is_enabled(FeatureKind::ConsoleLogs) {
            self.console.inspect(|monitor| {
                for observer in &self.observers {
                    monitor.register_observer(observer.clone());
                }
            })
        } else {
            None
        };

        let system = if features.is_enabled(FeatureKind::SystemLogs) {
            match self.store {
                Some(store) => {
                    let monitor = match &self.config.process_name {
                        Some(scope) => SystemLogsMonitor::open_scoped(store.as_ref(), scope),
                        None => SystemLogsMonitor::open(store.as_ref()),
                    }
                    .context("opening system log store client")?;
                    for observer in &self.observers {
                        monitor.register_observer(observer.clone());
                    }
                    Some(monitor)
                }
                None => None,
            }
        } else {
            None
        };

        Ok(Overlay {
            config: self.config,
            network,
            console,
            system,
        })
    }
}

impl std::fmt::Debug for OverlayBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayBuilder")
            .field("observers", &self.observers.len())
            .finish()
    }
}

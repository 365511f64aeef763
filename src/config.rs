//! Overlay configuration.
//!
//! Whether a telemetry feature is instrumented at all is the host
//! application's decision; the overlay consumes that decision as plain
//! configuration input and never toggles anything itself.

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::observer::FeatureKind;

/// Which telemetry features the host enabled for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub network: bool,
    pub console_logs: bool,
    pub system_logs: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            network: true,
            console_logs: true,
            system_logs: true,
        }
    }
}

impl FeatureToggles {
    /// True when the given feature should be captured.
    pub fn is_enabled(&self, kind: FeatureKind) -> bool {
        match kind {
            FeatureKind::Network => self.network,
            FeatureKind::ConsoleLogs => self.console_logs,
            FeatureKind::SystemLogs => self.system_logs,
        }
    }
}

/// Configuration for one monitoring session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Enabled telemetry features.
    pub features: FeatureToggles,
    /// Scope for system log queries. Defaults to the current process name
    /// when absent.
    pub process_name: Option<String>,
}

impl OverlayConfig {
    /// Load configuration from a file, overlaid with `PERISCOPE`-prefixed
    /// environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("PERISCOPE"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

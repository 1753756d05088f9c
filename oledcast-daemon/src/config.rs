//! Configuration for the oledcast daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use oledcast_core::device::GameSenseConfig;
use oledcast_core::scheduler::{SchedulerConfig, SourceToggles};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Panel selection and pacing.
    pub display: DisplayConfig,
    /// Browser-extension ingress.
    pub extension: ExtensionConfig,
    /// GameSense device service.
    pub device: DeviceConfig,
    /// OS media-session polling.
    pub media: MediaConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Panel selection and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Frames per second (1..=60).
    pub fps: u32,
    /// Show the clock when nothing else has content.
    pub clock: bool,
    /// Show now-playing media.
    pub media: bool,
    /// Show hardware stats (takes priority over everything else).
    pub hardware: bool,
    /// Draw `:SS` next to the time.
    pub clock_seconds: bool,
    /// Minimum time between two hardware sensor reads.
    pub hardware_refresh_ms: u64,
}

/// Browser-extension ingress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub enabled: bool,
    /// Loopback port the extension posts to.
    pub port: u16,
}

/// GameSense device service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Explicit `coreProps.json` candidates. Empty means platform defaults.
    pub core_props: Vec<PathBuf>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

/// OS media-session polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Session provider: "playerctl" or "none".
    pub provider: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Optional log file path. If empty, logs to stderr.
    pub file: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            clock: true,
            media: true,
            hardware: false,
            clock_seconds: true,
            hardware_refresh_ms: 1000,
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: oledcast_core::ingress::DEFAULT_EXTENSION_PORT,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            core_props: Vec::new(),
            request_timeout_ms: 500,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            provider: "playerctl".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: String::new(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Render as TOML, the same shape [`load`](Self::load) reads back.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Pacing and source toggles for the render loop.
    pub fn to_scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            fps: self.display.fps.clamp(1, 60),
            toggles: SourceToggles {
                hardware: self.display.hardware,
                media: self.display.media,
                clock: self.display.clock,
            },
        }
    }

    /// Discovery candidates and request timeout for the device client.
    pub fn to_device_config(&self) -> GameSenseConfig {
        let mut cfg = GameSenseConfig {
            request_timeout: Duration::from_millis(self.device.request_timeout_ms.max(1)),
            ..GameSenseConfig::default()
        };
        if !self.device.core_props.is_empty() {
            cfg.core_props = self.device.core_props.clone();
        }
        cfg
    }

    pub fn hardware_refresh(&self) -> Duration {
        Duration::from_millis(self.display.hardware_refresh_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! oledcast service core logic.
//!
//! Wires the device client, extension ingress, media aggregator,
//! hardware monitor and renderer into a [`RenderScheduler`] and runs it
//! until asked to stop.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{info, warn};

use oledcast_core::device::{FrameSink, GameSenseClient};
use oledcast_core::hardware::SysinfoMonitor;
use oledcast_core::ingress::{ExtensionReceiver, ExtensionSlot};
use oledcast_core::media::{
    MediaAggregator, MediaSessionProvider, NoMediaSession, PlayerctlSession,
};
use oledcast_core::render::OledRenderer;
use oledcast_core::scheduler::{RenderLoop, RenderScheduler};

use crate::config::DaemonConfig;

// ── OledcastService ──────────────────────────────────────────────

/// The top-level daemon service.
pub struct OledcastService {
    config: DaemonConfig,
    shutdown: Arc<Notify>,
}

impl OledcastService {
    pub fn new(config: DaemonConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// A handle that stops [`run`](Self::run) when notified. A
    /// notification sent before `run` starts waiting is kept.
    pub fn stop_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Run the service until stopped.
    ///
    /// 1. Starts the extension receiver (if enabled). A bind failure
    ///    only disables the extension path.
    /// 2. Builds the media aggregator with the configured session provider.
    /// 3. Starts the render loop, which registers with the device service.
    /// 4. On stop, halts the render loop before closing the receiver.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let slot = ExtensionSlot::new();
        let mut receiver = if self.config.extension.enabled {
            match ExtensionReceiver::start_with_slot(self.config.extension.port, slot.clone()) {
                Ok(receiver) => Some(receiver),
                Err(e) => {
                    warn!("extension receiver disabled: {e}");
                    None
                }
            }
        } else {
            info!("extension receiver disabled by config");
            None
        };

        let media = MediaAggregator::new(slot, session_provider(&self.config.media.provider));
        let device = Arc::new(GameSenseClient::new(self.config.to_device_config())?);

        let render_loop = RenderLoop::new(
            self.config.to_scheduler_config(),
            media,
            Box::new(SysinfoMonitor::new(self.config.hardware_refresh())),
            Box::new(OledRenderer::new(self.config.display.clock_seconds)),
            Arc::clone(&device) as Arc<dyn FrameSink>,
        );
        let mut scheduler = RenderScheduler::new(render_loop);
        scheduler.start();

        self.shutdown.notified().await;
        info!("stopping render loop");
        scheduler.stop().await;

        if let Some(receiver) = receiver.as_mut() {
            receiver.stop();
        }

        info!(
            "oledcast stopped ({} device requests, session {})",
            device.requests_sent(),
            device.phase()
        );
        Ok(())
    }
}

/// Session provider for the `media.provider` config value.
pub fn session_provider(name: &str) -> Box<dyn MediaSessionProvider> {
    match name.trim().to_ascii_lowercase().as_str() {
        "playerctl" => Box::new(PlayerctlSession::new()),
        "none" | "" => Box::new(NoMediaSession),
        other => {
            warn!("unknown media provider {other:?}; media sessions disabled");
            Box::new(NoMediaSession)
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

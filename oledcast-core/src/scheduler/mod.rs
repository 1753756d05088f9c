//! The render loop: one frame per tick, sent only when it changed.
//!
//! Each tick:
//!
//! 1. Pick the winning source (Hardware > Media > Clock).
//! 2. Ask the [`FrameRenderer`] for that source's bitmap.
//! 3. Encode it with [`FrameCodec`].
//! 4. Compare against the last sent frame and hand it to the
//!    [`FrameSink`] only when it differs.
//!
//! Errors inside a tick are logged and never end the loop. Only
//! [`RenderScheduler::stop`] does.

pub mod source;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::codec::FrameCodec;
use crate::delta::LastFrame;
use crate::device::FrameSink;
use crate::hardware::HardwareMonitor;
use crate::media::MediaAggregator;
use crate::render::FrameRenderer;

pub use source::{PAUSE_GRACE, PauseGrace, RenderSource, SourceToggles, select_source};

/// Upper bound [`RenderScheduler::stop`] waits for the loop to wind down.
pub const STOP_GRACE: Duration = Duration::from_secs(1);

// ── SchedulerConfig ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Target ticks per second. Values below 1 count as 1.
    pub fps: u32,
    pub toggles: SourceToggles,
}

impl SchedulerConfig {
    /// Tick period, `1000 / max(1, fps)` milliseconds.
    pub fn period(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            toggles: SourceToggles::default(),
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No source selected, or the loop is shutting down.
    Idle,
    /// Frame identical to the last one sent; nothing transmitted.
    Unchanged,
    Sent(RenderSource),
    /// Rendering or sending failed; the frame was dropped.
    Failed(RenderSource),
}

// ── RenderLoop ───────────────────────────────────────────────────

/// The state owned by the render task.
pub struct RenderLoop {
    config: SchedulerConfig,
    media: MediaAggregator,
    hardware: Box<dyn HardwareMonitor>,
    renderer: Box<dyn FrameRenderer>,
    sink: Arc<dyn FrameSink>,
    last: LastFrame,
    grace: PauseGrace,
    token: CancellationToken,
}

impl RenderLoop {
    pub fn new(
        config: SchedulerConfig,
        media: MediaAggregator,
        hardware: Box<dyn HardwareMonitor>,
        renderer: Box<dyn FrameRenderer>,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            config,
            media,
            hardware,
            renderer,
            sink,
            last: LastFrame::new(),
            grace: PauseGrace::new(),
            token: CancellationToken::new(),
        }
    }

    /// Frames handed to the sink so far.
    pub fn frames_sent(&self) -> u64 {
        self.last.sent_count()
    }

    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Run exactly one tick as of `now`.
    pub async fn tick_at(&mut self, now: Instant) -> TickOutcome {
        if self.token.is_cancelled() {
            return TickOutcome::Idle;
        }

        let toggles = self.config.toggles;

        // Media is only consulted when it could actually win.
        let media = if toggles.media && !toggles.hardware {
            self.media
                .current_media_at(now)
                .await
                .filter(|m| self.grace.admits_at(m, now))
        } else {
            None
        };

        let Some(source) = select_source(toggles, media.is_some()) else {
            return TickOutcome::Idle;
        };

        let rendered = match (source, &media) {
            (RenderSource::Hardware, _) => {
                let stats = self.hardware.stats();
                self.renderer.render_hardware(&stats)
            }
            (RenderSource::Media, Some(m)) => self.renderer.render_media(m),
            (RenderSource::Media, None) => return TickOutcome::Idle,
            (RenderSource::Clock, _) => self.renderer.render_clock(Local::now()),
        };
        let frame = match rendered {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{source} renderer failed: {e}");
                return TickOutcome::Failed(source);
            }
        };

        let encoded = FrameCodec::encode(&frame);
        if !self.last.differs(&encoded) {
            trace!("{source} frame unchanged");
            return TickOutcome::Unchanged;
        }

        // No new frames once stop() has been requested.
        if self.token.is_cancelled() {
            return TickOutcome::Idle;
        }

        let result = self.sink.send_frame(&encoded).await;
        self.last.record(encoded);
        match result {
            Ok(()) => TickOutcome::Sent(source),
            Err(e) => {
                debug!("{source} frame dropped: {e}");
                TickOutcome::Failed(source)
            }
        }
    }

    /// Initialise collaborators, then tick until cancelled.
    async fn run(mut self) -> Self {
        if let Err(e) = self.sink.initialize().await {
            warn!("device transport unavailable, frames will be dropped: {e}");
        }
        self.media.initialize().await;

        let period = self.config.period();
        info!("render loop started ({} fps, {:?} per tick)", self.config.fps.max(1), period);

        while !self.token.is_cancelled() {
            let started = Instant::now();
            self.tick_at(started).await;

            let wait = period.saturating_sub(started.elapsed());
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("render loop stopped after {} frames", self.last.sent_count());
        self
    }
}

// ── RenderScheduler ──────────────────────────────────────────────

/// Start/stop control over a [`RenderLoop`] running on its own task.
pub struct RenderScheduler {
    idle: Option<RenderLoop>,
    running: Option<(CancellationToken, JoinHandle<RenderLoop>)>,
}

impl RenderScheduler {
    pub fn new(render_loop: RenderLoop) -> Self {
        Self {
            idle: Some(render_loop),
            running: None,
        }
    }

    /// Spawn the loop. A no-op while it is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("render loop already running");
            return;
        }
        let Some(mut render_loop) = self.idle.take() else {
            warn!("render loop was lost during a previous stop; cannot restart");
            return;
        };

        let token = CancellationToken::new();
        render_loop.token = token.clone();
        // Each run re-discovers the device and sends a full first frame.
        render_loop.last.reset();
        let handle = tokio::spawn(render_loop.run());
        self.running = Some((token, handle));
    }

    /// Signal the loop and wait up to [`STOP_GRACE`] for it to finish.
    ///
    /// No frame is sent after this returns. A loop that does not finish
    /// in time is aborted and cannot be restarted.
    pub async fn stop(&mut self) {
        let Some((token, mut handle)) = self.running.take() else {
            return;
        };
        token.cancel();

        match tokio::time::timeout(STOP_GRACE, &mut handle).await {
            Ok(Ok(render_loop)) => self.idle = Some(render_loop),
            Ok(Err(e)) => warn!("render loop task failed: {e}"),
            Err(_) => {
                warn!("render loop did not stop within {STOP_GRACE:?}; aborting");
                handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// The loop while stopped, for inspection.
    pub fn render_loop(&self) -> Option<&RenderLoop> {
        self.idle.as_ref()
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some((token, handle)) = self.running.take() {
            token.cancel();
            handle.abort();
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! # oledcast-core
//!
//! Display orchestration engine for 128×40 monochrome OLED panels driven
//! through the local GameSense device service.
//!
//! This crate contains:
//! - **Frame**: `Frame` bitmaps and the 640-byte `EncodedFrame` wire image
//! - **Codec**: `FrameCodec` (bitmap → packed 1-bit, MSB first)
//! - **Delta**: `LastFrame` for skipping unchanged frames
//! - **Device**: `GameSenseClient` discovery, registration and frame push
//! - **Ingress**: `ExtensionReceiver`, the loopback HTTP endpoint for the browser extension
//! - **Media**: `MediaAggregator` reconciling extension pushes with session polls
//! - **Hardware**: `SysinfoMonitor` CPU/GPU/RAM sampling
//! - **Render**: `OledRenderer` clock, hardware and media panels
//! - **Scheduler**: `RenderScheduler` running the fixed-rate render loop
//! - **Error**: `OledError`, the `thiserror`-based error taxonomy

pub mod codec;
pub mod delta;
pub mod device;
pub mod error;
pub mod frame;
pub mod hardware;
pub mod ingress;
pub mod media;
pub mod render;
pub mod scheduler;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::FrameCodec;
pub use delta::LastFrame;
pub use device::{FrameSink, GameSenseClient, GameSenseConfig, SessionPhase};
pub use error::OledError;
pub use frame::{ENCODED_FRAME_LEN, EncodedFrame, FRAME_HEIGHT, FRAME_WIDTH, Frame};
pub use hardware::{HardwareMonitor, HardwareStats, SysinfoMonitor};
pub use ingress::{DEFAULT_EXTENSION_PORT, ExtensionReceiver, ExtensionSample, ExtensionSlot};
pub use media::{
    MediaAggregator, MediaOrigin, MediaSample, MediaSessionProvider, NoMediaSession,
    PlayerctlSession,
};
pub use render::{FrameRenderer, OledRenderer};
pub use scheduler::{
    RenderLoop, RenderScheduler, RenderSource, SchedulerConfig, SourceToggles, TickOutcome,
};

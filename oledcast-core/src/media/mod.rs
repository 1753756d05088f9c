//! "Now playing" state: samples, session providers and the aggregator.

pub mod aggregator;
pub mod provider;

use std::time::Instant;

use crate::ingress::ExtensionSample;

pub use aggregator::{EXTENSION_LOCK, MediaAggregator, POLL_INTERVAL};
pub use provider::{MediaSessionProvider, NoMediaSession, PlayerctlSession, SessionMedia};

/// Where a [`MediaSample`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOrigin {
    /// Pushed by the browser extension.
    Extension,
    /// Polled from the OS media session.
    Session,
}

/// The single current "now playing" view.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSample {
    pub title: String,
    pub artist: String,
    pub position_ms: f64,
    pub duration_ms: f64,
    pub is_playing: bool,
    pub observed_at: Instant,
    pub origin: MediaOrigin,
}

impl MediaSample {
    pub fn from_extension(sample: ExtensionSample, observed_at: Instant) -> Self {
        Self {
            title: sample.title,
            artist: sample.artist,
            position_ms: sample.progress_secs * 1000.0,
            duration_ms: sample.duration_secs * 1000.0,
            is_playing: sample.playing,
            observed_at,
            origin: MediaOrigin::Extension,
        }
    }

    pub fn from_session(media: SessionMedia, observed_at: Instant) -> Self {
        Self {
            title: media.title,
            artist: media.artist,
            position_ms: media.position_ms,
            duration_ms: media.duration_ms,
            is_playing: !media.paused,
            observed_at,
            origin: MediaOrigin::Session,
        }
    }

    /// A sample without a title carries nothing worth drawing.
    pub fn has_content(&self) -> bool {
        !self.title.is_empty()
    }

    /// Playback progress clamped to `0.0..=1.0`; zero without a duration.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration_ms > 0.0 {
            (self.position_ms / self.duration_ms).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

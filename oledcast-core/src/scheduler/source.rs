//! Source arbitration: which panel owns the next frame.

use std::fmt;
use std::time::{Duration, Instant};

use crate::media::MediaSample;

/// How long a paused track keeps the panel after it was last seen playing.
pub const PAUSE_GRACE: Duration = Duration::from_secs(5);

/// Render sources in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderSource {
    Hardware,
    Media,
    Clock,
}

impl fmt::Display for RenderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => write!(f, "hardware"),
            Self::Media => write!(f, "media"),
            Self::Clock => write!(f, "clock"),
        }
    }
}

/// Which sources may be selected at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceToggles {
    pub hardware: bool,
    pub media: bool,
    pub clock: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            hardware: false,
            media: true,
            clock: true,
        }
    }
}

/// Highest-priority enabled source with content.
///
/// Hardware and clock always have content when enabled; media only when
/// the caller says so.
pub fn select_source(toggles: SourceToggles, media_has_content: bool) -> Option<RenderSource> {
    if toggles.hardware {
        Some(RenderSource::Hardware)
    } else if toggles.media && media_has_content {
        Some(RenderSource::Media)
    } else if toggles.clock {
        Some(RenderSource::Clock)
    } else {
        None
    }
}

// ── PauseGrace ───────────────────────────────────────────────────

/// Pause hysteresis for the media source.
#[derive(Debug, Default, Clone)]
pub struct PauseGrace {
    last_playing_at: Option<Instant>,
}

impl PauseGrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `media` should hold the panel at `now`.
    ///
    /// A playing sample is admitted and refreshes the playing stamp. A
    /// paused one is admitted while the stamp is under [`PAUSE_GRACE`] old.
    pub fn admits_at(&mut self, media: &MediaSample, now: Instant) -> bool {
        if !media.has_content() {
            return false;
        }
        if media.is_playing {
            self.last_playing_at = Some(now);
            return true;
        }
        self.last_playing_at
            .is_some_and(|t| now.saturating_duration_since(t) < PAUSE_GRACE)
    }

    pub fn last_playing_at(&self) -> Option<Instant> {
        self.last_playing_at
    }
}

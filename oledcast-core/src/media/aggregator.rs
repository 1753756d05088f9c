//! Reconciles the extension push channel with the session pull channel.
//!
//! Precedence per query:
//!
//! 1. A fresh extension sample wins unconditionally and refreshes the
//!    extension-activity stamp.
//! 2. Within [`EXTENSION_LOCK`] of the last extension activity nothing is
//!    reported, so a briefly silent extension does not flap to OS media.
//! 3. Otherwise the session provider is consulted, at most once per
//!    [`POLL_INTERVAL`]; queries in between return the cached sample.
//!
//! A provider error or an empty answer keeps the cached sample, so a
//! session that briefly disappears does not blank the panel.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::ingress::ExtensionSlot;
use crate::media::provider::MediaSessionProvider;
use crate::media::MediaSample;

/// Quiet period after extension activity before polling resumes.
pub const EXTENSION_LOCK: Duration = Duration::from_millis(5000);

/// Minimum spacing between two provider queries.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct MediaAggregator {
    extension: ExtensionSlot,
    provider: Box<dyn MediaSessionProvider>,
    last_extension_at: Option<Instant>,
    last_poll_at: Option<Instant>,
    cached: Option<MediaSample>,
    provider_queries: u64,
}

impl MediaAggregator {
    pub fn new(extension: ExtensionSlot, provider: Box<dyn MediaSessionProvider>) -> Self {
        Self {
            extension,
            provider,
            last_extension_at: None,
            last_poll_at: None,
            cached: None,
            provider_queries: 0,
        }
    }

    /// Prepare the session provider. Failure only disables the poll path.
    pub async fn initialize(&mut self) {
        if let Err(e) = self.provider.initialize().await {
            warn!("media session provider unavailable: {e}");
        }
    }

    pub async fn current_media(&mut self) -> Option<MediaSample> {
        self.current_media_at(Instant::now()).await
    }

    pub async fn current_media_at(&mut self, now: Instant) -> Option<MediaSample> {
        if let Some(ext) = self.extension.latest_at(now) {
            self.last_extension_at = Some(now);
            let sample = MediaSample::from_extension(ext, now);
            self.cached = Some(sample.clone());
            return Some(sample);
        }

        if let Some(last) = self.last_extension_at {
            if now.saturating_duration_since(last) <= EXTENSION_LOCK {
                return None;
            }
        }

        let poll_due = self
            .last_poll_at
            .is_none_or(|t| now.saturating_duration_since(t) > POLL_INTERVAL);
        if poll_due {
            self.last_poll_at = Some(now);
            self.provider_queries += 1;
            match self.provider.current().await {
                Ok(Some(media)) => self.cached = Some(MediaSample::from_session(media, now)),
                Ok(None) => trace!("no media session reported, keeping cached sample"),
                Err(e) => debug!("media session poll failed, keeping cached sample: {e}"),
            }
        }

        self.cached.clone()
    }

    /// Provider queries issued so far.
    pub fn provider_queries(&self) -> u64 {
        self.provider_queries
    }
}

// ── Tests ────────────────────────────────────────────────────────

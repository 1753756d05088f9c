//! OS media-session providers (the pull side of the media path).
//!
//! The aggregator only needs "what is the current session playing".
//! [`PlayerctlSession`] answers that on MPRIS desktops by shelling out
//! to `playerctl`; [`NoMediaSession`] is the inert fallback.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::OledError;

/// One answer from a session provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionMedia {
    pub title: String,
    pub artist: String,
    pub position_ms: f64,
    pub duration_ms: f64,
    pub paused: bool,
}

/// Queries the system-wide current media session.
#[async_trait]
pub trait MediaSessionProvider: Send {
    /// One-time setup before the first query. Failure is logged by the
    /// caller; later queries then report nothing.
    async fn initialize(&mut self) -> Result<(), OledError> {
        Ok(())
    }

    /// `Ok(None)` when no session is active.
    async fn current(&mut self) -> Result<Option<SessionMedia>, OledError>;
}

// ── NoMediaSession ───────────────────────────────────────────────

/// Provider for platforms without a session API.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMediaSession;

#[async_trait]
impl MediaSessionProvider for NoMediaSession {
    async fn current(&mut self) -> Result<Option<SessionMedia>, OledError> {
        Ok(None)
    }
}

// ── PlayerctlSession ─────────────────────────────────────────────

const METADATA_FORMAT: &str = "{{status}}\t{{title}}\t{{artist}}\t{{position}}\t{{mpris:length}}";

/// MPRIS session lookup through the `playerctl` CLI.
pub struct PlayerctlSession {
    program: String,
    timeout: Duration,
    available: bool,
}

impl PlayerctlSession {
    pub fn new() -> Self {
        Self::with_program("playerctl")
    }

    /// Use a different executable (tests, wrappers).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_millis(400),
            available: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, OledError> {
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output();
        match tokio::time::timeout(self.timeout, output).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(OledError::Timeout(self.timeout)),
        }
    }
}

impl Default for PlayerctlSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSessionProvider for PlayerctlSession {
    async fn initialize(&mut self) -> Result<(), OledError> {
        let output = self.run(&["--version"]).await.map_err(|e| {
            OledError::Provider(format!("{} not usable: {e}", self.program))
        })?;
        if !output.status.success() {
            return Err(OledError::Provider(format!(
                "{} --version exited with {}",
                self.program, output.status
            )));
        }
        self.available = true;
        info!(
            "media sessions via {} {}",
            self.program,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    async fn current(&mut self) -> Result<Option<SessionMedia>, OledError> {
        if !self.available {
            return Ok(None);
        }

        let output = self.run(&["metadata", "--format", METADATA_FORMAT]).await?;
        if !output.status.success() {
            // "No players found" exits non-zero.
            debug!("no active media session");
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed = stdout.lines().next().and_then(parse_metadata_line);
        if parsed.is_none() {
            warn!("unrecognised playerctl output: {:?}", stdout.trim());
        }
        Ok(parsed)
    }
}

/// Parse one `status\ttitle\tartist\tposition_us\tlength_us` line.
fn parse_metadata_line(line: &str) -> Option<SessionMedia> {
    let mut fields = line.split('\t');
    let status = fields.next()?.trim();
    let title = fields.next()?.trim().to_string();
    let artist = fields.next().unwrap_or_default().trim().to_string();
    let micros = |s: Option<&str>| {
        s.and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    };
    let position_ms = micros(fields.next()) / 1000.0;
    let duration_ms = micros(fields.next()) / 1000.0;

    if status.is_empty() {
        return None;
    }

    Some(SessionMedia {
        title,
        artist,
        position_ms,
        duration_ms,
        paused: !status.eq_ignore_ascii_case("playing"),
    })
}

// ── Tests ────────────────────────────────────────────────────────

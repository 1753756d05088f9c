//! Device session state machine.
//!
//! Models what the transport believes about the local device service,
//! with validated transitions that return `Result` instead of panicking.

use crate::error::OledError;

// ── SessionPhase ─────────────────────────────────────────────────

/// The current phase of the device session.
///
/// ```text
///  Uninitialized ──► Discovering ──► Registered
///        ▲                │              │
///        └────────────────┘◄─────────────┘ (re-initialize)
/// ```
///
/// Send failures while `Registered` do not change the phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No known service address. Initial state and the state after any
    /// discovery or registration failure.
    #[default]
    Uninitialized,

    /// Reading the discovery file and registering the game.
    Discovering,

    /// Game registered and event bound; frames may be sent.
    Registered,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Discovering => write!(f, "Discovering"),
            Self::Registered => write!(f, "Registered"),
        }
    }
}

// ── DeviceSession ────────────────────────────────────────────────

/// Address plus phase. Single writer (the client's initialize path).
#[derive(Debug, Clone, Default)]
pub struct DeviceSession {
    base_address: Option<String>,
    phase: SessionPhase,
}

impl DeviceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// `true` once the game is registered and the event bound.
    pub fn is_registered(&self) -> bool {
        self.phase == SessionPhase::Registered
    }

    /// The service base URL, only while registered.
    pub fn address(&self) -> Option<&str> {
        if self.is_registered() {
            self.base_address.as_deref()
        } else {
            None
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Discovering`.
    ///
    /// Valid from: `Uninitialized`, `Registered` (explicit re-initialize).
    pub fn begin_discovery(&mut self) -> Result<(), OledError> {
        match self.phase {
            SessionPhase::Uninitialized | SessionPhase::Registered => {
                self.base_address = None;
                self.phase = SessionPhase::Discovering;
                Ok(())
            }
            SessionPhase::Discovering => Err(OledError::InvalidTransition(
                "cannot discover: discovery already in progress",
            )),
        }
    }

    /// Transition to `Registered` with the discovered address.
    ///
    /// Valid from: `Discovering`.
    pub fn complete_registration(&mut self, base_address: String) -> Result<(), OledError> {
        match self.phase {
            SessionPhase::Discovering => {
                self.base_address = Some(base_address);
                self.phase = SessionPhase::Registered;
                Ok(())
            }
            _ => Err(OledError::InvalidTransition(
                "cannot register: not in Discovering state",
            )),
        }
    }

    /// Force-reset to `Uninitialized` regardless of current state.
    pub fn force_reset(&mut self) {
        self.base_address = None;
        self.phase = SessionPhase::Uninitialized;
    }
}

// ── Tests ────────────────────────────────────────────────────────

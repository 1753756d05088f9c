//! Device transport: discovery, session state and the GameSense client.
//!
//! | Module      | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `discovery` | Locate `coreProps.json` and read the address     |
//! | `session`   | `Uninitialized → Discovering → Registered`       |
//! | `gamesense` | Registration, event binding and frame push       |

pub mod discovery;
pub mod gamesense;
pub mod session;

use async_trait::async_trait;

use crate::error::OledError;
use crate::frame::EncodedFrame;

pub use gamesense::{GameSenseClient, GameSenseConfig};
pub use session::{DeviceSession, SessionPhase};

/// Where encoded frames go.
///
/// The render loop awaits one `send_frame` before starting the next
/// tick, so implementations never see concurrent sends from it.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Establish the channel. Failure leaves sends as no-ops.
    async fn initialize(&self) -> Result<(), OledError>;

    /// Push one frame, best effort.
    async fn send_frame(&self, frame: &EncodedFrame) -> Result<(), OledError>;
}

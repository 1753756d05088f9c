//! HTTP client for the local GameSense device service.
//!
//! The service lives on a loopback address published in `coreProps.json`.
//! Registration is a fixed three-step sequence; frames are pushed as
//! JSON events afterwards. Every request carries a short timeout so an
//! unreachable service cannot stall the render loop.
//!
//! ## Wire format
//!
//! ```text
//! POST /remove_game       {game}
//! POST /game_metadata     {game, game_display_name, developer, deinitialize_timer_length_ms}
//! POST /bind_game_event   {game, event, min_value, max_value, icon_id,
//!                          handlers: [{device-type: "screened-128x40", mode: "screen",
//!                                      zone: "one", datas: [{has-text: false,
//!                                                            image-data: [0; 640]}]}]}
//! POST /game_event        {game, event, data: {frame: {"image-data-128x40": [u8; 640]}}}
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::device::discovery;
use crate::device::session::{DeviceSession, SessionPhase};
use crate::device::FrameSink;
use crate::error::OledError;
use crate::frame::{ENCODED_FRAME_LEN, EncodedFrame};

// ── Constants ────────────────────────────────────────────────────

/// Game identifier the service routes events by.
pub const GAME: &str = "OLEDCAST";
/// Human-readable name shown in the vendor UI.
pub const GAME_DISPLAY_NAME: &str = "oledcast";
/// Developer string shown in the vendor UI.
pub const DEVELOPER: &str = "oledcast";
/// The single bound event.
pub const EVENT: &str = "UPDATE";
/// The service forgets the game after this long without events.
pub const DEINITIALIZE_TIMER_MS: u32 = 60_000;
/// Panel type the handler is bound to.
pub const DEVICE_TYPE: &str = "screened-128x40";
/// Key of the frame bytes inside the event payload.
pub const IMAGE_DATA_KEY: &str = "image-data-128x40";
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

// ── Payloads ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct RemoveGame<'a> {
    game: &'a str,
}

#[derive(Serialize)]
struct GameMetadata<'a> {
    game: &'a str,
    game_display_name: &'a str,
    developer: &'a str,
    deinitialize_timer_length_ms: u32,
}

#[derive(Serialize)]
struct BindGameEvent<'a> {
    game: &'a str,
    event: &'a str,
    min_value: i32,
    max_value: i32,
    icon_id: u32,
    handlers: Vec<ScreenHandler<'a>>,
}

#[derive(Serialize)]
struct ScreenHandler<'a> {
    #[serde(rename = "device-type")]
    device_type: &'a str,
    mode: &'a str,
    zone: &'a str,
    datas: Vec<ScreenData<'a>>,
}

#[derive(Serialize)]
struct ScreenData<'a> {
    #[serde(rename = "has-text")]
    has_text: bool,
    #[serde(rename = "image-data")]
    image_data: &'a [u8],
}

#[derive(Serialize)]
struct GameEvent<'a> {
    game: &'a str,
    event: &'a str,
    data: EventData<'a>,
}

#[derive(Serialize)]
struct EventData<'a> {
    frame: FramePayload<'a>,
}

#[derive(Serialize)]
struct FramePayload<'a> {
    #[serde(rename = "image-data-128x40")]
    image_data: &'a [u8],
}

const BLANK_IMAGE: [u8; ENCODED_FRAME_LEN] = [0u8; ENCODED_FRAME_LEN];

fn bind_payload() -> BindGameEvent<'static> {
    BindGameEvent {
        game: GAME,
        event: EVENT,
        min_value: 0,
        max_value: 1,
        icon_id: 1,
        handlers: vec![ScreenHandler {
            device_type: DEVICE_TYPE,
            mode: "screen",
            zone: "one",
            datas: vec![ScreenData {
                has_text: false,
                image_data: &BLANK_IMAGE,
            }],
        }],
    }
}

fn frame_payload(frame: &EncodedFrame) -> GameEvent<'_> {
    GameEvent {
        game: GAME,
        event: EVENT,
        data: EventData {
            frame: FramePayload {
                image_data: frame.as_bytes(),
            },
        },
    }
}

// ── GameSenseConfig ──────────────────────────────────────────────

/// Configuration for [`GameSenseClient`].
#[derive(Debug, Clone)]
pub struct GameSenseConfig {
    /// Discovery-file candidates, searched in order.
    pub core_props: Vec<PathBuf>,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl Default for GameSenseConfig {
    fn default() -> Self {
        Self {
            core_props: discovery::default_core_props_paths(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ── GameSenseClient ──────────────────────────────────────────────

/// Best-effort client for the device service.
///
/// Discovery is attempted only by [`initialize`](Self::initialize);
/// the client never re-discovers on its own. While unregistered,
/// [`send_frame`](Self::send_frame) is a no-op that touches no socket.
pub struct GameSenseClient {
    http: reqwest::Client,
    config: GameSenseConfig,
    session: RwLock<DeviceSession>,
    requests: AtomicU64,
}

impl GameSenseClient {
    pub fn new(config: GameSenseConfig) -> Result<Self, OledError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            config,
            session: RwLock::new(DeviceSession::new()),
            requests: AtomicU64::new(0),
        })
    }

    /// Whether frames currently go anywhere.
    pub fn is_registered(&self) -> bool {
        self.read_session().is_registered()
    }

    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.read_session().phase().clone()
    }

    /// Outbound HTTP requests attempted since construction.
    pub fn requests_sent(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Discover the service and register the game.
    ///
    /// Order: remove previous registration (failure ignored), register
    /// metadata, bind the screen event. Any failure leaves the client
    /// unregistered.
    pub async fn initialize(&self) -> Result<(), OledError> {
        self.write_session().begin_discovery()?;

        let address = match discovery::discover(&self.config.core_props).await {
            Ok(addr) => addr,
            Err(e) => {
                error!("device service not found: {e}");
                self.write_session().force_reset();
                return Err(e);
            }
        };
        info!("found device service at {address}");

        if let Err(e) = self.post(&address, "/remove_game", &RemoveGame { game: GAME }).await {
            debug!("remove_game ignored: {e}");
        }

        let registered = async {
            self.post(
                &address,
                "/game_metadata",
                &GameMetadata {
                    game: GAME,
                    game_display_name: GAME_DISPLAY_NAME,
                    developer: DEVELOPER,
                    deinitialize_timer_length_ms: DEINITIALIZE_TIMER_MS,
                },
            )
            .await?;
            self.post(&address, "/bind_game_event", &bind_payload()).await
        }
        .await;

        match registered {
            Ok(()) => {
                self.write_session().complete_registration(address)?;
                info!("registered {GAME} and bound {DEVICE_TYPE} event");
                Ok(())
            }
            Err(e) => {
                error!("could not register with device service: {e}");
                self.write_session().force_reset();
                Err(e)
            }
        }
    }

    /// Push one frame. Dropped silently (not queued, not retried) by the
    /// caller on failure.
    pub async fn send_frame(&self, frame: &EncodedFrame) -> Result<(), OledError> {
        let Some(address) = self.read_session().address().map(str::to_owned) else {
            trace!("frame dropped: device session not registered");
            return Ok(());
        };
        self.post(&address, "/game_event", &frame_payload(frame)).await
    }

    // ── Internal ─────────────────────────────────────────────────

    async fn post<T: Serialize + ?Sized>(
        &self,
        base: &str,
        endpoint: &'static str,
        body: &T,
    ) -> Result<(), OledError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let response = self
            .http
            .post(format!("{base}{endpoint}"))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("device service {endpoint} answered {status}");
            return Err(OledError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn read_session(&self) -> std::sync::RwLockReadGuard<'_, DeviceSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> std::sync::RwLockWriteGuard<'_, DeviceSession> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FrameSink for GameSenseClient {
    async fn initialize(&self) -> Result<(), OledError> {
        GameSenseClient::initialize(self).await
    }

    async fn send_frame(&self, frame: &EncodedFrame) -> Result<(), OledError> {
        GameSenseClient::send_frame(self, frame).await
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn bind_payload_shape() {
        let v = serde_json::to_value(bind_payload()).unwrap();
        assert_eq!(v["game"], GAME);
        assert_eq!(v["event"], EVENT);
        let handler = &v["handlers"][0];
        assert_eq!(handler["device-type"], "screened-128x40");
        assert_eq!(handler["mode"], "screen");
        assert_eq!(handler["zone"], "one");
        assert_eq!(handler["datas"][0]["has-text"], false);
        let image = handler["datas"][0]["image-data"].as_array().unwrap();
        assert_eq!(image.len(), 640);
        assert!(image.iter().all(|b| b == &json!(0)));
    }

    #[test]
    fn frame_payload_carries_byte_values() {
        let mut bytes = [0u8; ENCODED_FRAME_LEN];
        bytes[0] = 0x80;
        bytes[639] = 0xFF;
        let frame = EncodedFrame::from_bytes(bytes);

        let v = serde_json::to_value(frame_payload(&frame)).unwrap();
        let data = v["data"]["frame"][IMAGE_DATA_KEY].as_array().unwrap();
        assert_eq!(data.len(), 640);
        assert_eq!(data[0], json!(128));
        assert_eq!(data[639], json!(255));
        assert_eq!(v["event"], Value::from(EVENT));
    }

    #[test]
    fn metadata_payload_fields() {
        let v = serde_json::to_value(GameMetadata {
            game: GAME,
            game_display_name: GAME_DISPLAY_NAME,
            developer: DEVELOPER,
            deinitialize_timer_length_ms: DEINITIALIZE_TIMER_MS,
        })
        .unwrap();
        assert_eq!(v["deinitialize_timer_length_ms"], 60_000);
        assert_eq!(v["game_display_name"], GAME_DISPLAY_NAME);
    }

    #[tokio::test]
    async fn unregistered_send_makes_no_request() {
        let client = GameSenseClient::new(GameSenseConfig {
            core_props: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
        .unwrap();

        client.send_frame(&EncodedFrame::blank()).await.unwrap();
        assert_eq!(client.requests_sent(), 0);
        assert!(!client.is_registered());
    }

    #[tokio::test]
    async fn failed_discovery_stays_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let client = GameSenseClient::new(GameSenseConfig {
            core_props: vec![dir.path().join("coreProps.json")],
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
        .unwrap();

        assert!(client.initialize().await.is_err());
        assert_eq!(client.phase(), SessionPhase::Uninitialized);
        assert_eq!(client.requests_sent(), 0);
    }
}

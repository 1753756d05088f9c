//! Loopback HTTP endpoint fed by the browser extension.
//!
//! # Purpose
//!
//! Browser players are invisible to the OS media session, so a
//! cooperating extension pushes "now playing" state here. Only the
//! freshest accepted sample is kept (a mailbox of one, latest wins).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐                      ┌──────────────────────┐
//! │  Ingress thread          │   ExtensionSlot      │  Render loop         │
//! │  (rouille HTTP)          │  Arc<Mutex<Option>>  │  (MediaAggregator)   │
//! │                          │ ───── write ───────▶ │                      │
//! │  POST /extension_data    │ ◀──── read ───────── │  latest() each tick  │
//! └──────────────────────────┘                      └──────────────────────┘
//! ```
//!
//! # Endpoints
//!
//! | Method  | Path              | Result                                  |
//! |---------|-------------------|-----------------------------------------|
//! | OPTIONS | any               | 204 with CORS headers                   |
//! | POST    | `/extension_data` | 200 on accept, 400 on malformed JSON,   |
//! |         |                   | 413 above 64 KiB                        |
//! | other   | any               | 404                                     |

use std::io::Read;
use std::net::SocketAddr;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rouille::{Request, Response};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::OledError;

// ── Constants ────────────────────────────────────────────────────

/// Default loopback port the extension posts to.
pub const DEFAULT_EXTENSION_PORT: u16 = 2408;

/// The only accepted path.
pub const EXTENSION_PATH: &str = "/extension_data";

/// A sample older than this is treated as "extension inactive".
pub const EXTENSION_FRESHNESS: Duration = Duration::from_secs(5);

const MAX_BODY_BYTES: u64 = 64 * 1024;

// ── ExtensionSample ──────────────────────────────────────────────

/// One pushed "now playing" update.
///
/// `progress`/`duration` are seconds. Malformed numbers read as zero
/// and malformed booleans as `false` rather than failing the request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionSample {
    pub title: String,
    pub artist: String,
    pub progress_secs: f64,
    pub duration_secs: f64,
    pub playing: bool,
    /// Unrecognised keys, kept as received.
    pub extra: Map<String, Value>,
}

impl ExtensionSample {
    /// Parse a request body. Anything other than a JSON object is rejected.
    pub fn from_json(body: &[u8]) -> Result<Self, OledError> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(OledError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Lenient field extraction from a flat object.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let title = map.remove("title").map(lenient_string).unwrap_or_default();
        let artist = map.remove("artist").map(lenient_string).unwrap_or_default();
        let progress_secs = map.remove("progress").map_or(0.0, |v| lenient_f64(&v));
        let duration_secs = map.remove("duration").map_or(0.0, |v| lenient_f64(&v));
        let playing = map.remove("playing").is_some_and(|v| lenient_bool(&v));

        Self {
            title,
            artist,
            progress_secs,
            duration_secs,
            playing,
            extra: map,
        }
    }
}

fn lenient_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_f64(v: &Value) -> f64 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn lenient_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── ExtensionSlot ────────────────────────────────────────────────

#[derive(Debug)]
struct Stamped {
    sample: ExtensionSample,
    accepted_at: Instant,
}

/// The latest accepted sample, shared between the ingress thread
/// (single writer) and the aggregator (reader) under one mutex.
#[derive(Debug, Clone, Default)]
pub struct ExtensionSlot {
    inner: Arc<Mutex<Option<Stamped>>>,
}

impl ExtensionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest sample, stamped now.
    pub fn accept(&self, sample: ExtensionSample) {
        self.accept_at(sample, Instant::now());
    }

    /// Replace the latest sample with an explicit acceptance time.
    pub fn accept_at(&self, sample: ExtensionSample, accepted_at: Instant) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Stamped {
            sample,
            accepted_at,
        });
    }

    /// The latest sample if accepted within [`EXTENSION_FRESHNESS`].
    pub fn latest(&self) -> Option<ExtensionSample> {
        self.latest_at(Instant::now())
    }

    pub fn latest_at(&self, now: Instant) -> Option<ExtensionSample> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|s| now.saturating_duration_since(s.accepted_at) < EXTENSION_FRESHNESS)
            .map(|s| s.sample.clone())
    }
}

// ── Request handling ─────────────────────────────────────────────

fn with_cors(response: Response) -> Response {
    response
        .with_additional_header("Access-Control-Allow-Origin", "*")
        .with_additional_header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .with_additional_header("Access-Control-Allow-Headers", "Content-Type")
}

/// Route one request. Exposed for tests that drive it with
/// `Request::fake_http`.
pub fn handle_request(request: &Request, slot: &ExtensionSlot) -> Response {
    if request.method() == "OPTIONS" {
        return with_cors(Response::empty_204());
    }

    let response = rouille::router!(request,
        (POST) ["/extension_data"] => {
            accept_body(request, slot)
        },
        _ => Response::empty_404()
    );
    with_cors(response)
}

fn accept_body(request: &Request, slot: &ExtensionSlot) -> Response {
    let mut body = Vec::new();
    if let Some(data) = request.data() {
        if let Err(e) = data.take(MAX_BODY_BYTES + 1).read_to_end(&mut body) {
            warn!("failed to read extension body: {e}");
            return Response::text("unreadable body").with_status_code(400);
        }
    }
    if body.len() as u64 > MAX_BODY_BYTES {
        warn!("extension body exceeds {MAX_BODY_BYTES} bytes; dropped");
        return Response::text("payload too large").with_status_code(413);
    }

    match ExtensionSample::from_json(&body) {
        Ok(sample) => {
            debug!(title = %sample.title, playing = sample.playing, "extension sample accepted");
            slot.accept(sample);
            Response::text("ok")
        }
        Err(e) => {
            warn!("failed to process extension data: {e}");
            Response::text("malformed payload").with_status_code(400)
        }
    }
}

// ── ExtensionReceiver ────────────────────────────────────────────

/// The ingress listener, running on its own thread.
///
/// Dropping the receiver stops the listener.
pub struct ExtensionReceiver {
    addr: SocketAddr,
    slot: ExtensionSlot,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ExtensionReceiver {
    /// Bind `127.0.0.1:port` (0 picks a free port) and start accepting.
    pub fn start(port: u16) -> Result<Self, OledError> {
        Self::start_with_slot(port, ExtensionSlot::new())
    }

    /// Like [`start`](Self::start) but writes into an existing slot.
    pub fn start_with_slot(port: u16, slot: ExtensionSlot) -> Result<Self, OledError> {
        let handler_slot = slot.clone();
        let server = rouille::Server::new(("127.0.0.1", port), move |request| {
            handle_request(request, &handler_slot)
        })
        .map_err(|e| OledError::IngressBind {
            port,
            reason: e.to_string(),
        })?
        .pool_size(1);

        let addr = server.server_addr();
        let (thread, shutdown) = server.stoppable();
        info!("extension receiver listening on http://{addr}{EXTENSION_PATH}");

        Ok(Self {
            addr,
            slot,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    /// The bound loopback address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// A handle to the shared latest-sample cell.
    pub fn slot(&self) -> ExtensionSlot {
        self.slot.clone()
    }

    /// Close the listener and join its thread.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The thread may already be gone; a closed channel is expected then.
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("extension receiver thread panicked");
            } else {
                info!("extension receiver stopped");
            }
        }
    }
}

impl Drop for ExtensionReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ────────────────────────────────────────────────────────

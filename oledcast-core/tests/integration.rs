//! Integration tests: device registration and frame push against a fake
//! device service, the extension receiver over real HTTP, and the render
//! loop end to end.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use oledcast_core::{
    EncodedFrame, ExtensionReceiver, FrameSink, GameSenseClient, GameSenseConfig,
    MediaAggregator, MediaOrigin, NoMediaSession, OledError, OledRenderer, RenderLoop,
    RenderScheduler, RenderSource, SchedulerConfig, SessionPhase, SourceToggles, SysinfoMonitor,
    TickOutcome,
};
use serde_json::Value;
use tokio_test::{assert_err, assert_ok};

// ── Helpers ──────────────────────────────────────────────────────

/// A loopback stand-in for the vendor device service. Records every
/// request and answers 500 on the endpoints listed in `failing`.
struct FakeDeviceService {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeDeviceService {
    fn start() -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let failing = Arc::new(Mutex::new(HashSet::new()));

        let (log, fail) = (Arc::clone(&requests), Arc::clone(&failing));
        let server = rouille::Server::new("127.0.0.1:0", move |request| {
            let mut body = String::new();
            if let Some(mut data) = request.data() {
                use std::io::Read;
                data.read_to_string(&mut body).unwrap();
            }
            let json = serde_json::from_str(&body).unwrap_or(Value::Null);
            let path = request.url();
            log.lock().unwrap().push((path.clone(), json));

            if fail.lock().unwrap().contains(&path) {
                rouille::Response::text("nope").with_status_code(500)
            } else {
                rouille::Response::json(&serde_json::json!({}))
            }
        })
        .unwrap();

        let addr = server.server_addr();
        let (thread, shutdown) = server.stoppable();
        Self {
            addr,
            requests,
            failing,
            shutdown: Some(shutdown),
            thread: Some(thread),
        }
    }

    fn fail(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    fn heal(&self, path: &str) {
        self.failing.lock().unwrap().remove(path);
    }

    fn paths(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    fn bodies(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Write a `coreProps.json` pointing at this service.
    fn core_props(&self, dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("coreProps.json");
        std::fs::write(&path, format!(r#"{{"address":"{}"}}"#, self.addr)).unwrap();
        path
    }
}

impl Drop for FakeDeviceService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn client_for(service: &FakeDeviceService, dir: &tempfile::TempDir) -> GameSenseClient {
    GameSenseClient::new(GameSenseConfig {
        core_props: vec![dir.path().join("missing.json"), service.core_props(dir)],
        request_timeout: Duration::from_millis(500),
    })
    .unwrap()
}

fn frame_with(byte: u8) -> EncodedFrame {
    let mut bytes = [0u8; 640];
    bytes[0] = byte;
    EncodedFrame::from_bytes(bytes)
}

// ── Device transport ─────────────────────────────────────────────

#[tokio::test]
async fn test_registration_order_and_frame_push() {
    let service = FakeDeviceService::start();
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&service, &dir);

    assert_ok!(client.initialize().await);
    assert!(client.is_registered());
    assert_eq!(client.phase(), SessionPhase::Registered);
    assert_eq!(
        service.paths(),
        vec!["/remove_game", "/game_metadata", "/bind_game_event"]
    );

    let metadata = &service.bodies("/game_metadata")[0];
    assert_eq!(metadata["game"], "OLEDCAST");
    assert_eq!(metadata["deinitialize_timer_length_ms"], 60_000);

    client.send_frame(&frame_with(0xA5)).await.unwrap();
    let events = service.bodies("/game_event");
    assert_eq!(events.len(), 1);
    let data = events[0]["data"]["frame"]["image-data-128x40"]
        .as_array()
        .unwrap();
    assert_eq!(data.len(), 640);
    assert_eq!(data[0], 0xA5);
    assert_eq!(events[0]["event"], "UPDATE");
}

#[tokio::test]
async fn test_remove_game_failure_is_ignored() {
    let service = FakeDeviceService::start();
    service.fail("/remove_game");
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&service, &dir);

    client.initialize().await.unwrap();
    assert!(client.is_registered());
}

#[tokio::test]
async fn test_bind_failure_leaves_client_unregistered() {
    let service = FakeDeviceService::start();
    service.fail("/bind_game_event");
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&service, &dir);

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, OledError::Status { status: 500, .. }));
    assert_eq!(client.phase(), SessionPhase::Uninitialized);

    let before = client.requests_sent();
    client.send_frame(&frame_with(1)).await.unwrap();
    assert_eq!(client.requests_sent(), before);
    assert!(service.bodies("/game_event").is_empty());

    // A later initialize can still succeed.
    service.heal("/bind_game_event");
    client.initialize().await.unwrap();
    assert!(client.is_registered());
}

#[tokio::test]
async fn test_send_failure_keeps_registration() {
    let service = FakeDeviceService::start();
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&service, &dir);
    client.initialize().await.unwrap();

    service.fail("/game_event");
    assert_err!(client.send_frame(&frame_with(2)).await);
    assert!(client.is_registered());

    service.heal("/game_event");
    client.send_frame(&frame_with(3)).await.unwrap();
    assert_eq!(service.bodies("/game_event").len(), 2);
}

#[tokio::test]
async fn test_unreachable_service_times_out_quickly() {
    // Reserve a port, then close it so nothing answers there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = tempfile::tempdir().unwrap();
    let props = dir.path().join("coreProps.json");
    std::fs::write(&props, format!(r#"{{"address":"127.0.0.1:{port}"}}"#)).unwrap();

    let client = GameSenseClient::new(GameSenseConfig {
        core_props: vec![props],
        request_timeout: Duration::from_millis(300),
    })
    .unwrap();

    let started = std::time::Instant::now();
    assert_err!(client.initialize().await);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!client.is_registered());
}

// ── Extension ingress ────────────────────────────────────────────

#[tokio::test]
async fn test_extension_receiver_over_http() {
    let mut receiver = ExtensionReceiver::start(0).unwrap();
    let url = format!("http://{}/extension_data", receiver.local_addr());
    let http = reqwest::Client::builder().no_proxy().build().unwrap();

    let ok = http
        .post(&url)
        .header("Content-Type", "application/json")
        .body(r#"{"title":"A","artist":"B","progress":"12.5","duration":200,"playing":"true"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);
    assert_eq!(
        ok.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let sample = receiver.slot().latest().unwrap();
    assert_eq!(sample.title, "A");
    assert!(sample.playing);
    assert_eq!(sample.progress_secs, 12.5);

    let bad = http.post(&url).body("{not json").send().await.unwrap();
    assert_eq!(bad.status().as_u16(), 400);
    assert_eq!(receiver.slot().latest().unwrap().title, "A");

    let preflight = http
        .request(reqwest::Method::OPTIONS, &url)
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status().as_u16(), 204);

    let wrong = http
        .get(format!("http://{}/elsewhere", receiver.local_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 404);

    receiver.stop();
}

#[tokio::test]
async fn test_pushed_sample_reaches_aggregator() {
    let receiver = ExtensionReceiver::start(0).unwrap();
    let url = format!("http://{}/extension_data", receiver.local_addr());
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .post(&url)
        .body(r#"{"title":"Pushed","progress":3,"duration":6,"playing":true}"#)
        .send()
        .await
        .unwrap();

    let mut media = MediaAggregator::new(receiver.slot(), Box::new(NoMediaSession));
    let sample = media.current_media().await.unwrap();
    assert_eq!(sample.title, "Pushed");
    assert_eq!(sample.origin, MediaOrigin::Extension);
    assert_eq!(sample.position_ms, 3000.0);
    assert_eq!(sample.progress_ratio(), 0.5);
}

// ── Render loop end to end ───────────────────────────────────────

fn render_loop(client: Arc<GameSenseClient>, toggles: SourceToggles) -> RenderLoop {
    RenderLoop::new(
        SchedulerConfig { fps: 20, toggles },
        MediaAggregator::new(oledcast_core::ExtensionSlot::new(), Box::new(NoMediaSession)),
        Box::new(SysinfoMonitor::new(Duration::from_secs(1))),
        Box::new(OledRenderer::new(false)),
        client as Arc<dyn FrameSink>,
    )
}

#[tokio::test]
async fn test_tick_sends_clock_frame_to_device() {
    let service = FakeDeviceService::start();
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(client_for(&service, &dir));
    client.initialize().await.unwrap();

    let mut rl = render_loop(
        Arc::clone(&client),
        SourceToggles {
            hardware: false,
            media: true,
            clock: true,
        },
    );
    assert_eq!(rl.tick().await, TickOutcome::Sent(RenderSource::Clock));

    let events = service.bodies("/game_event");
    assert_eq!(events.len(), 1);
    let lit = events[0]["data"]["frame"]["image-data-128x40"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b.as_u64() != Some(0))
        .count();
    assert!(lit > 0, "clock frame should light some pixels");
}

#[tokio::test]
async fn test_scheduler_registers_before_first_frame() {
    let service = FakeDeviceService::start();
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(client_for(&service, &dir));

    let mut scheduler = RenderScheduler::new(render_loop(
        Arc::clone(&client),
        SourceToggles {
            hardware: true,
            media: false,
            clock: false,
        },
    ));
    scheduler.start();

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while service.bodies("/game_event").is_empty() && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    scheduler.stop().await;
    assert!(!scheduler.is_running());

    let paths = service.paths();
    assert_eq!(&paths[..3], ["/remove_game", "/game_metadata", "/bind_game_event"]);
    assert!(paths[3..].iter().all(|p| p == "/game_event"));
    assert!(!paths[3..].is_empty());

    let sent = service.bodies("/game_event").len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(service.bodies("/game_event").len(), sent);
}

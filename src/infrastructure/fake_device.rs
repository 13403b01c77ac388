// In-process stand-in for the logger's HTTP server, used by tests
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const VALID_LIVE_JSON: &str = r#"{"gpsQualityLevel":3,"battery":3.84,"maxSpeed":27.4,
"avgSpeed":11.2,"currentSpeed":9.5,"distance":0.418,"isLoggingActive":true}"#;

pub const VALID_SETTINGS_JSON: &str = r#"{"spiffsTotal":1441792,"spiffsUsed":360448,
"currentSsid":"MadSpeed_C0FFEE","currentPassword":"12345678C0FFEE","macAddressSuffix":"C0FFEE"}"#;

pub const SAMPLE_CSV: &str = "timestamp,speed,distance\n0,0.0,0\n1,6.5,2\n2,6.6,2\n3,12.0,9\n4,18.5,21\n";

#[derive(Debug)]
struct ServerState {
    live_json: String,
    csv: String,
    settings_json: String,
    failure: Option<(u16, String)>,
    delay: Duration,
    commands: Vec<&'static str>,
    wifi_requests: Vec<(String, String)>,
}

type Shared = Arc<Mutex<ServerState>>;

#[derive(Deserialize)]
struct WifiBody {
    ssid: String,
    password: String,
}

pub struct FakeDeviceServer {
    base_url: String,
    state: Shared,
    task: tokio::task::JoinHandle<()>,
}

impl FakeDeviceServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState {
            live_json: VALID_LIVE_JSON.to_string(),
            csv: SAMPLE_CSV.to_string(),
            settings_json: VALID_SETTINGS_JSON.to_string(),
            failure: None,
            delay: Duration::ZERO,
            commands: Vec::new(),
            wifi_requests: Vec::new(),
        }));

        let router = Router::new()
            .route("/data", get(data))
            .route("/download_csv", get(download_csv))
            .route("/settings", get(settings))
            .route("/start", post(start))
            .route("/stop", post(stop))
            .route("/reset", post(reset))
            .route("/update_wifi_config", post(update_wifi_config))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_live_json(&self, json: &str) {
        self.state.lock().unwrap().live_json = json.to_string();
    }

    pub fn set_csv(&self, csv: &str) {
        self.state.lock().unwrap().csv = csv.to_string();
    }

    /// GET endpoints wait this long before answering
    pub fn set_response_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    /// Every endpoint answers with `status` and `body` from now on
    pub fn fail_with(&self, status: u16, body: &str) {
        self.state.lock().unwrap().failure = Some((status, body.to_string()));
    }

    pub fn commands(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn wifi_requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().wifi_requests.clone()
    }
}

impl Drop for FakeDeviceServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn failure(state: &ServerState) -> Option<Response> {
    state.failure.as_ref().map(|(status, body)| {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, body.clone()).into_response()
    })
}

async fn stall(state: &Shared) {
    let delay = state.lock().unwrap().delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn json(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn data(State(state): State<Shared>) -> Response {
    stall(&state).await;
    let state = state.lock().unwrap();
    failure(&state).unwrap_or_else(|| json(state.live_json.clone()))
}

async fn download_csv(State(state): State<Shared>) -> Response {
    stall(&state).await;
    let state = state.lock().unwrap();
    failure(&state)
        .unwrap_or_else(|| ([(header::CONTENT_TYPE, "text/csv")], state.csv.clone()).into_response())
}

async fn settings(State(state): State<Shared>) -> Response {
    stall(&state).await;
    let state = state.lock().unwrap();
    failure(&state).unwrap_or_else(|| json(state.settings_json.clone()))
}

fn command(state: &Shared, name: &'static str) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(response) = failure(&state) {
        return response;
    }
    state.commands.push(name);
    StatusCode::OK.into_response()
}

async fn start(State(state): State<Shared>) -> Response {
    command(&state, "start")
}

async fn stop(State(state): State<Shared>) -> Response {
    command(&state, "stop")
}

async fn reset(State(state): State<Shared>) -> Response {
    command(&state, "reset")
}

async fn update_wifi_config(State(state): State<Shared>, Json(body): Json<WifiBody>) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(response) = failure(&state) {
        return response;
    }
    state.wifi_requests.push((body.ssid, body.password));
    json(r#"{"success":true,"message":"saved, restarting"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_view::testing::RecordingChart;
    use crate::application::poller::LivePoller;
    use crate::application::session::{DashboardSession, STOP_SETTLE_DELAY};
    use crate::domain::live::{BatteryCalibration, LiveDisplay, LoggingStatus};
    use crate::domain::log::ChartPoint;
    use crate::domain::view::{Axis, PanOffset, Range};
    use crate::infrastructure::http_device::HttpDevice;
    use tokio::sync::watch;

    #[tokio::test]
    async fn test_stop_over_http_reimports_log_into_reset_view() {
        let server = FakeDeviceServer::start().await;
        server.set_csv("timestamp,speed,distance\n0,1.0,0\n");
        let device = Arc::new(
            HttpDevice::new(server.base_url(), Duration::from_secs(2), Duration::from_secs(5))
                .unwrap(),
        );
        let (live_out, live) = watch::channel(LiveDisplay::disconnected());
        let poller = LivePoller::new(device.clone(), BatteryCalibration::default());
        let mut session =
            DashboardSession::new(device, poller, Arc::new(live_out), RecordingChart::default());

        session.import_log(false).await.unwrap();
        session.controller_mut().zoom_in(Axis::X);
        session.controller_mut().set_slider(Axis::Y, -60.0);
        server.set_csv(SAMPLE_CSV);

        let started = std::time::Instant::now();
        session.stop_logging().await.unwrap();
        assert!(started.elapsed() >= STOP_SETTLE_DELAY);

        assert_eq!(server.commands(), vec!["stop"]);
        let state = session.view_state();
        assert_eq!(state.entries, 5);
        assert_eq!(state.points, 4);
        assert_eq!(state.full_range.x, Range::new(0.0, 100.0));
        assert_eq!(state.full_range.y, Range::new(0.0, 18.5));
        assert_eq!(state.visible, state.full_range);
        assert_eq!(state.pan_offset, PanOffset::default());
        assert_eq!(state.sliders, [0.0, 0.0]);
        assert_eq!(
            session.controller().chart().points,
            vec![
                ChartPoint::new(0.0, 0.0),
                ChartPoint::new(2.0, 6.5),
                ChartPoint::new(9.0, 12.0),
                ChartPoint::new(21.0, 18.5),
            ]
        );
        // live panel refreshed from /data after the import
        assert_eq!(live.borrow().status, LoggingStatus::Active);
    }
}

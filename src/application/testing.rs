// In-memory device used by service and session tests
use crate::application::device_api::{DeviceApi, DeviceError};
use crate::domain::live::LiveSnapshot;
use crate::domain::settings::{DeviceSettings, WifiUpdateOutcome, WifiUpdateRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Status(u16),
    Transport,
}

#[derive(Default)]
struct FakeState {
    log: String,
    snapshot: Option<LiveSnapshot>,
    settings: Option<DeviceSettings>,
    wifi_outcome: Option<WifiUpdateOutcome>,
    failures: HashMap<&'static str, Failure>,
    fail_all: Option<Failure>,
    calls: Vec<&'static str>,
    wifi_requests: Vec<WifiUpdateRequest>,
}

#[derive(Default)]
pub struct FakeDevice {
    state: Mutex<FakeState>,
}

pub fn snapshot(current_speed: f64, logging: bool) -> LiveSnapshot {
    LiveSnapshot {
        gps_quality_level: 2,
        battery: 4.2,
        max_speed: 30.0,
        avg_speed: 12.5,
        current_speed,
        distance: 0.75,
        is_logging_active: logging,
    }
}

impl FakeDevice {
    pub fn with_log(log: &str) -> Self {
        let device = Self::default();
        device.set_log(log);
        device.set_snapshot(snapshot(0.0, false));
        device
    }

    pub fn failing_status(status: u16) -> Self {
        let device = Self::default();
        device.state.lock().unwrap().fail_all = Some(Failure::Status(status));
        device
    }

    pub fn failing_transport() -> Self {
        let device = Self::default();
        device.state.lock().unwrap().fail_all = Some(Failure::Transport);
        device
    }

    pub fn set_log(&self, log: &str) {
        self.state.lock().unwrap().log = log.to_string();
    }

    pub fn set_snapshot(&self, snapshot: LiveSnapshot) {
        self.state.lock().unwrap().snapshot = Some(snapshot);
    }

    pub fn set_settings(&self, settings: DeviceSettings) {
        self.state.lock().unwrap().settings = Some(settings);
    }

    pub fn set_wifi_outcome(&self, outcome: WifiUpdateOutcome) {
        self.state.lock().unwrap().wifi_outcome = Some(outcome);
    }

    pub fn fail(&self, endpoint: &'static str, failure: Failure) {
        self.state.lock().unwrap().failures.insert(endpoint, failure);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn wifi_requests(&self) -> Vec<WifiUpdateRequest> {
        self.state.lock().unwrap().wifi_requests.clone()
    }

    fn enter(&self, endpoint: &'static str) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(endpoint);
        let failure = state.failures.get(endpoint).copied().or(state.fail_all);
        match failure {
            None => Ok(()),
            Some(Failure::Status(status)) => Err(DeviceError::Status {
                endpoint,
                status,
                body: "fake failure".to_string(),
            }),
            Some(Failure::Transport) => Err(DeviceError::Transport {
                endpoint,
                source: "connection refused".into(),
            }),
        }
    }

    fn missing(endpoint: &'static str) -> DeviceError {
        DeviceError::MalformedResponse {
            endpoint,
            reason: "no fixture".to_string(),
        }
    }
}

#[async_trait]
impl DeviceApi for FakeDevice {
    async fn live_snapshot(&self) -> Result<LiveSnapshot, DeviceError> {
        self.enter("live_snapshot")?;
        self.state
            .lock()
            .unwrap()
            .snapshot
            .clone()
            .ok_or_else(|| Self::missing("live_snapshot"))
    }

    async fn download_log(&self) -> Result<String, DeviceError> {
        self.enter("download_log")?;
        Ok(self.state.lock().unwrap().log.clone())
    }

    async fn start_logging(&self) -> Result<(), DeviceError> {
        self.enter("start_logging")
    }

    async fn stop_logging(&self) -> Result<(), DeviceError> {
        self.enter("stop_logging")
    }

    async fn reset(&self) -> Result<(), DeviceError> {
        self.enter("reset")
    }

    async fn settings(&self) -> Result<DeviceSettings, DeviceError> {
        self.enter("settings")?;
        self.state
            .lock()
            .unwrap()
            .settings
            .clone()
            .ok_or_else(|| Self::missing("settings"))
    }

    async fn update_wifi_config(
        &self,
        request: &WifiUpdateRequest,
    ) -> Result<WifiUpdateOutcome, DeviceError> {
        self.enter("update_wifi_config")?;
        let mut state = self.state.lock().unwrap();
        state.wifi_requests.push(request.clone());
        Ok(state.wifi_outcome.clone().unwrap_or(WifiUpdateOutcome {
            success: true,
            message: String::new(),
        }))
    }
}

// HTTP implementation of the device API
use crate::application::device_api::{DeviceApi, DeviceError};
use crate::domain::live::LiveSnapshot;
use crate::domain::settings::{DeviceSettings, WifiUpdateOutcome, WifiUpdateRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DATA: &str = "/data";
const DOWNLOAD_CSV: &str = "/download_csv";
const START: &str = "/start";
const STOP: &str = "/stop";
const RESET: &str = "/reset";
const SETTINGS: &str = "/settings";
const UPDATE_WIFI_CONFIG: &str = "/update_wifi_config";

/// Polls use the short `poll_timeout`; the log download gets its own
/// budget. Commands have no deadline.
#[derive(Debug, Clone)]
pub struct HttpDevice {
    base_url: String,
    client: reqwest::Client,
    poll_timeout: Duration,
    download_timeout: Duration,
}

impl HttpDevice {
    pub fn new(
        base_url: &str,
        poll_timeout: Duration,
        download_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            poll_timeout,
            download_timeout,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn transport(endpoint: &'static str, e: reqwest::Error) -> DeviceError {
        DeviceError::Transport {
            endpoint,
            source: Box::new(e),
        }
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, DeviceError> {
        tracing::debug!("Device request {}", endpoint);
        let response = request
            .send()
            .await
            .map_err(|e| Self::transport(endpoint, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceError::Status {
                endpoint,
                status,
                body,
            });
        }

        Ok(response)
    }

    async fn poll_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, DeviceError> {
        let request = self.client.get(self.url(endpoint)).timeout(self.poll_timeout);
        let response = self.send(endpoint, request).await?;
        Self::decode(endpoint, response).await
    }

    async fn post_command(&self, endpoint: &'static str) -> Result<(), DeviceError> {
        self.send(endpoint, self.client.post(self.url(endpoint)))
            .await
            .map(|_| ())
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, DeviceError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::transport(endpoint, e))?;

        serde_json::from_slice(&bytes).map_err(|e| DeviceError::MalformedResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DeviceApi for HttpDevice {
    async fn live_snapshot(&self) -> Result<LiveSnapshot, DeviceError> {
        self.poll_json(DATA).await
    }

    async fn download_log(&self) -> Result<String, DeviceError> {
        let request = self
            .client
            .get(self.url(DOWNLOAD_CSV))
            .timeout(self.download_timeout);
        let response = self.send(DOWNLOAD_CSV, request).await?;
        response
            .text()
            .await
            .map_err(|e| Self::transport(DOWNLOAD_CSV, e))
    }

    async fn start_logging(&self) -> Result<(), DeviceError> {
        self.post_command(START).await
    }

    async fn stop_logging(&self) -> Result<(), DeviceError> {
        self.post_command(STOP).await
    }

    async fn reset(&self) -> Result<(), DeviceError> {
        self.post_command(RESET).await
    }

    async fn settings(&self) -> Result<DeviceSettings, DeviceError> {
        self.poll_json(SETTINGS).await
    }

    async fn update_wifi_config(
        &self,
        request: &WifiUpdateRequest,
    ) -> Result<WifiUpdateOutcome, DeviceError> {
        let builder = self
            .client
            .post(self.url(UPDATE_WIFI_CONFIG))
            .json(request);
        let response = self.send(UPDATE_WIFI_CONFIG, builder).await?;
        Self::decode(UPDATE_WIFI_CONFIG, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::DashboardConfig;
    use crate::infrastructure::fake_device::{FakeDeviceServer, VALID_LIVE_JSON};

    fn client(server: &FakeDeviceServer) -> HttpDevice {
        HttpDevice::new(
            &format!("{}/", server.base_url()),
            Duration::from_secs(2),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_live_snapshot_decodes_schema() {
        let server = FakeDeviceServer::start().await;
        let snapshot: LiveSnapshot = client(&server).live_snapshot().await.unwrap();

        let expected: LiveSnapshot = serde_json::from_str(VALID_LIVE_JSON).unwrap();
        assert_eq!(snapshot, expected);
    }

    #[tokio::test]
    async fn test_live_snapshot_rejects_missing_fields() {
        let server = FakeDeviceServer::start().await;
        server.set_live_json(r#"{"battery":3.7}"#);

        let err = client(&server).live_snapshot().await.unwrap_err();
        assert!(matches!(err, DeviceError::MalformedResponse { endpoint: "/data", .. }));
    }

    #[tokio::test]
    async fn test_settings_decode() {
        let server = FakeDeviceServer::start().await;
        let settings = client(&server).settings().await.unwrap();

        assert_eq!(settings.spiffs_total, 1_441_792);
        assert_eq!(settings.mac_address_suffix, "C0FFEE");
    }

    #[tokio::test]
    async fn test_download_log_returns_raw_text() {
        let server = FakeDeviceServer::start().await;
        server.set_csv("timestamp,speed,distance\n0,3.5,0\n");

        let csv = client(&server).download_log().await.unwrap();
        assert_eq!(csv, "timestamp,speed,distance\n0,3.5,0\n");
    }

    #[tokio::test]
    async fn test_slow_download_outlives_poll_timeout() {
        let server = FakeDeviceServer::start().await;
        server.set_response_delay(Duration::from_millis(600));
        let config = DashboardConfig::default();
        let device = HttpDevice::new(
            server.base_url(),
            Duration::from_millis(200),
            config.download_timeout(),
        )
        .unwrap();

        let csv = device.download_log().await.unwrap();
        assert!(csv.starts_with("timestamp,speed,distance"));

        let err = device.live_snapshot().await.unwrap_err();
        assert!(matches!(err, DeviceError::Transport { endpoint: "/data", .. }));
    }

    #[tokio::test]
    async fn test_download_timeout_is_enforced() {
        let server = FakeDeviceServer::start().await;
        server.set_response_delay(Duration::from_millis(600));
        let device = HttpDevice::new(
            server.base_url(),
            Duration::from_secs(2),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = device.download_log().await.unwrap_err();
        assert!(matches!(err, DeviceError::Transport { endpoint: "/download_csv", .. }));
    }

    #[tokio::test]
    async fn test_status_errors_carry_body() {
        let server = FakeDeviceServer::start().await;
        server.fail_with(500, "log file missing");

        let err = client(&server).download_log().await.unwrap_err();
        match err {
            DeviceError::Status { endpoint, status, body } => {
                assert_eq!(endpoint, "/download_csv");
                assert_eq!(status, 500);
                assert_eq!(body, "log file missing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_commands_post_to_device() {
        let server = FakeDeviceServer::start().await;
        let device = client(&server);

        device.start_logging().await.unwrap();
        device.stop_logging().await.unwrap();
        device.reset().await.unwrap();

        assert_eq!(server.commands(), vec!["start", "stop", "reset"]);
    }

    #[tokio::test]
    async fn test_update_wifi_config_round_trip() {
        let server = FakeDeviceServer::start().await;
        let request = WifiUpdateRequest {
            ssid: "Track_9C".to_string(),
            password: "hunter29C".to_string(),
        };

        let outcome = client(&server).update_wifi_config(&request).await.unwrap();
        assert!(outcome.success);
        assert_eq!(server.wifi_requests(), vec![("Track_9C".to_string(), "hunter29C".to_string())]);
    }

    #[tokio::test]
    async fn test_unreachable_device_is_transport_error() {
        let device = HttpDevice::new(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            Duration::from_millis(500),
        )
        .unwrap();

        let err = device.live_snapshot().await.unwrap_err();
        assert!(matches!(err, DeviceError::Transport { .. }));
        assert!(!err.is_http_status());
    }
}

// Device API trait - the HTTP contract served by the logger firmware
use crate::domain::live::LiveSnapshot;
use crate::domain::settings::{DeviceSettings, WifiUpdateOutcome, WifiUpdateRequest};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },
}

impl DeviceError {
    /// True when the device answered, but with a non-success status
    pub fn is_http_status(&self) -> bool {
        matches!(self, DeviceError::Status { .. })
    }
}

#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Live status snapshot (`GET /data`)
    async fn live_snapshot(&self) -> Result<LiveSnapshot, DeviceError>;

    /// Full run log as CSV text (`GET /download_csv`)
    async fn download_log(&self) -> Result<String, DeviceError>;

    async fn start_logging(&self) -> Result<(), DeviceError>;

    async fn stop_logging(&self) -> Result<(), DeviceError>;

    /// Clear statistics and delete the stored log
    async fn reset(&self) -> Result<(), DeviceError>;

    async fn settings(&self) -> Result<DeviceSettings, DeviceError>;

    async fn update_wifi_config(
        &self,
        request: &WifiUpdateRequest,
    ) -> Result<WifiUpdateOutcome, DeviceError>;
}

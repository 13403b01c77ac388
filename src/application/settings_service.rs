// Settings service - Use case for reading and changing device settings
use crate::application::device_api::{DeviceApi, DeviceError};
use crate::domain::settings::{SettingsView, WifiForm, WifiFormError, WifiUpdateOutcome};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    InvalidForm(#[from] WifiFormError),
    #[error("device rejected Wi-Fi settings: {0}")]
    Rejected(String),
    #[error("connection or server error: {0}")]
    Device(#[from] DeviceError),
}

#[derive(Clone)]
pub struct SettingsService {
    api: Arc<dyn DeviceApi>,
}

impl SettingsService {
    pub fn new(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    pub async fn load(&self) -> Result<SettingsView, DeviceError> {
        let settings = self.api.settings().await?;
        Ok(SettingsView::from_settings(&settings))
    }

    /// Send new credentials. On success the device restarts its access point.
    pub async fn save_wifi(&self, form: &WifiForm) -> Result<WifiUpdateOutcome, SettingsError> {
        let request = form.to_request()?;
        tracing::info!("Updating Wi-Fi access point to SSID {:?}", request.ssid);

        let outcome = self.api.update_wifi_config(&request).await?;
        if !outcome.success {
            return Err(SettingsError::Rejected(outcome.message));
        }
        Ok(outcome)
    }
}

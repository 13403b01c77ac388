// Device settings: flash storage usage and Wi-Fi access point credentials
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Body of `GET /settings`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    pub spiffs_total: u64,
    pub spiffs_used: u64,
    #[serde(default)]
    pub current_ssid: String,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub mac_address_suffix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLevel {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub percent_used: u8,
}

impl StorageUsage {
    pub fn new(total_bytes: u64, used_bytes: u64) -> Self {
        let percent_used = if total_bytes > 0 {
            (used_bytes as f64 / total_bytes as f64 * 100.0)
                .round()
                .clamp(0.0, 100.0) as u8
        } else {
            0
        };
        Self {
            total_bytes,
            used_bytes,
            percent_used,
        }
    }

    pub fn level(&self) -> StorageLevel {
        match self.percent_used {
            90..=u8::MAX => StorageLevel::Critical,
            70..=89 => StorageLevel::Warning,
            _ => StorageLevel::Ok,
        }
    }
}

impl fmt::Display for StorageUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} MB / {:.2} MB ({}%)",
            self.used_bytes as f64 / BYTES_PER_MB,
            self.total_bytes as f64 / BYTES_PER_MB,
            self.percent_used
        )
    }
}

/// SSID and password as edited by the user: a free prefix followed by the
/// fixed MAC suffix the device appends to keep access points unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WifiForm {
    pub ssid_prefix: String,
    pub password_prefix: String,
    pub mac_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WifiFormError {
    #[error("network name and password must not be empty")]
    EmptyCredentials,
}

/// Body of `POST /update_wifi_config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiUpdateRequest {
    pub ssid: String,
    pub password: String,
}

/// Reply of `POST /update_wifi_config`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WifiUpdateOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl WifiForm {
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        let suffix = &settings.mac_address_suffix;
        Self {
            ssid_prefix: strip_suffix(&settings.current_ssid, suffix).to_string(),
            password_prefix: strip_suffix(&settings.current_password, suffix).to_string(),
            mac_suffix: suffix.clone(),
        }
    }

    pub fn to_request(&self) -> Result<WifiUpdateRequest, WifiFormError> {
        let ssid = self.ssid_prefix.trim();
        let password = self.password_prefix.trim();
        if ssid.is_empty() || password.is_empty() {
            return Err(WifiFormError::EmptyCredentials);
        }

        let suffix = self.mac_suffix.trim();
        Ok(WifiUpdateRequest {
            ssid: format!("{}{}", ssid, suffix),
            password: format!("{}{}", password, suffix),
        })
    }
}

fn strip_suffix<'a>(value: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return value;
    }
    value.strip_suffix(suffix).unwrap_or(value)
}

/// Everything the settings panel shows; `None` storage means the last
/// refresh failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsView {
    pub storage: Option<StorageUsage>,
    pub wifi: WifiForm,
}

impl SettingsView {
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        Self {
            storage: Some(StorageUsage::new(settings.spiffs_total, settings.spiffs_used)),
            wifi: WifiForm::from_settings(settings),
        }
    }
}

impl fmt::Display for SettingsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Some(storage) => writeln!(f, "storage: {}", storage)?,
            None => writeln!(f, "storage: -- MB / -- MB (--%)")?,
        }
        write!(
            f,
            "wifi: ssid {:?} + {:?}, password {:?} + {:?}",
            self.wifi.ssid_prefix, self.wifi.mac_suffix, self.wifi.password_prefix, self.wifi.mac_suffix
        )
    }
}

use crate::domain::live::{BatteryCalibration, DEFAULT_MAX_VOLTAGE, DEFAULT_MIN_VOLTAGE};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard";
const ENV_PREFIX: &str = "MADSPEED";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub device: DeviceEndpoint,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub battery: BatterySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceEndpoint {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Applies to the live and settings polls
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_download_timeout_ms")]
    pub download_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    #[serde(default = "default_live_interval_ms")]
    pub live_interval_ms: u64,
    #[serde(default = "default_settings_interval_ms")]
    pub settings_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatterySettings {
    #[serde(default = "default_min_voltage")]
    pub min_voltage: f64,
    #[serde(default = "default_max_voltage")]
    pub max_voltage: f64,
}

fn default_base_url() -> String {
    // access point address of the logger
    "http://192.168.4.1".to_string()
}

fn default_request_timeout_ms() -> u64 {
    900
}

fn default_download_timeout_ms() -> u64 {
    // the whole log is streamed from flash over the access point
    30_000
}

fn default_live_interval_ms() -> u64 {
    1000
}

fn default_settings_interval_ms() -> u64 {
    2000
}

fn default_min_voltage() -> f64 {
    DEFAULT_MIN_VOLTAGE
}

fn default_max_voltage() -> f64 {
    DEFAULT_MAX_VOLTAGE
}

impl Default for DeviceEndpoint {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            download_timeout_ms: default_download_timeout_ms(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            live_interval_ms: default_live_interval_ms(),
            settings_interval_ms: default_settings_interval_ms(),
        }
    }
}

impl Default for BatterySettings {
    fn default() -> Self {
        Self {
            min_voltage: default_min_voltage(),
            max_voltage: default_max_voltage(),
        }
    }
}

impl DashboardConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.device.request_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.device.download_timeout_ms)
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.polling.live_interval_ms.max(1))
    }

    pub fn settings_interval(&self) -> Duration {
        Duration::from_millis(self.polling.settings_interval_ms.max(1))
    }

    pub fn battery_calibration(&self) -> BatteryCalibration {
        BatteryCalibration {
            min_voltage: self.battery.min_voltage,
            max_voltage: self.battery.max_voltage,
        }
    }
}

/// Load `<path>.toml` (optional) overlaid with `MADSPEED__SECTION__KEY`
/// environment variables.
pub fn load_dashboard_config(path: Option<&str>) -> anyhow::Result<DashboardConfig> {
    let file = match path {
        Some(path) => config::File::with_name(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
    };

    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

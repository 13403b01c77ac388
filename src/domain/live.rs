// Live status reported by the device and its derived presentation
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_MIN_VOLTAGE: f64 = 3.0;
pub const DEFAULT_MAX_VOLTAGE: f64 = 4.2;
pub const GPS_BARS: u8 = 4;

/// Body of `GET /data`. Distance is in kilometers here, unlike the CSV log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    #[serde(default)]
    pub gps_quality_level: u8,
    pub battery: f64,
    pub max_speed: f64,
    pub avg_speed: f64,
    pub current_speed: f64,
    pub distance: f64,
    pub is_logging_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryCalibration {
    pub min_voltage: f64,
    pub max_voltage: f64,
}

impl Default for BatteryCalibration {
    fn default() -> Self {
        Self {
            min_voltage: DEFAULT_MIN_VOLTAGE,
            max_voltage: DEFAULT_MAX_VOLTAGE,
        }
    }
}

impl BatteryCalibration {
    /// Linear map from cell voltage to a whole percentage in `0..=100`
    pub fn percent(&self, voltage: f64) -> u8 {
        let span = self.max_voltage - self.min_voltage;
        if span <= 0.0 || voltage.is_nan() {
            return 0;
        }
        let percent = ((voltage - self.min_voltage) / span * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Low,
    Medium,
    High,
}

impl BatteryLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..=20 => BatteryLevel::Low,
            21..=50 => BatteryLevel::Medium,
            _ => BatteryLevel::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingStatus {
    Active,
    Inactive,
    ConnectionError,
}

impl fmt::Display for LoggingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LoggingStatus::Active => "Active (recording)",
            LoggingStatus::Inactive => "Inactive",
            LoggingStatus::ConnectionError => "Connection error",
        };
        f.write_str(text)
    }
}

/// What the dashboard shows for one poll. Each poll replaces the previous
/// display entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveDisplay {
    pub gps_bars: u8,
    pub battery_percent: u8,
    pub current_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub avg_speed: Option<f64>,
    pub distance_m: Option<i64>,
    pub status: LoggingStatus,
}

impl LiveDisplay {
    pub fn from_snapshot(snapshot: &LiveSnapshot, calibration: &BatteryCalibration) -> Self {
        Self {
            gps_bars: snapshot.gps_quality_level.min(GPS_BARS),
            battery_percent: calibration.percent(snapshot.battery),
            current_speed: Some(snapshot.current_speed),
            max_speed: Some(snapshot.max_speed),
            avg_speed: Some(snapshot.avg_speed),
            distance_m: Some(km_to_display_meters(snapshot.distance)),
            status: if snapshot.is_logging_active {
                LoggingStatus::Active
            } else {
                LoggingStatus::Inactive
            },
        }
    }

    /// Shown when the device could not be reached or answered badly
    pub fn disconnected() -> Self {
        Self {
            status: LoggingStatus::ConnectionError,
            ..Self::reset()
        }
    }

    /// Shown right after the device statistics were reset
    pub fn reset() -> Self {
        Self {
            gps_bars: 0,
            battery_percent: 0,
            current_speed: None,
            max_speed: None,
            avg_speed: None,
            distance_m: None,
            status: LoggingStatus::Inactive,
        }
    }

    pub fn battery_level(&self) -> BatteryLevel {
        BatteryLevel::from_percent(self.battery_percent)
    }

    pub fn gps_bar_text(&self) -> String {
        (0..GPS_BARS)
            .map(|i| if i < self.gps_bars { '█' } else { '░' })
            .collect()
    }
}

impl Default for LiveDisplay {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl fmt::Display for LiveDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GPS {} | battery {}% | speed {} | max {} | avg {} | distance {} | {}",
            self.gps_bar_text(),
            self.battery_percent,
            speed_text(self.current_speed),
            speed_text(self.max_speed),
            speed_text(self.avg_speed),
            distance_text(self.distance_m),
            self.status
        )
    }
}

/// Live distance arrives in kilometers; the display uses whole meters
pub fn km_to_display_meters(km: f64) -> i64 {
    (km * 1000.0).round() as i64
}

pub fn speed_text(speed: Option<f64>) -> String {
    match speed {
        Some(v) => format!("{:.1} km/h", v),
        None => "-- km/h".to_string(),
    }
}

pub fn distance_text(meters: Option<i64>) -> String {
    match meters {
        Some(m) => format!("{} m", m),
        None => "-- m".to_string(),
    }
}

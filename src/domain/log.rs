// Logged run data: CSV rows from the device and the points kept for plotting
use thiserror::Error;

/// Minimum distance change (meters) for a log entry to become a new chart point
pub const MIN_DISTANCE_DIFF: f64 = 1.0;
/// Minimum speed change (km/h) for a log entry to become a new chart point
pub const MIN_SPEED_DIFF: f64 = 0.5;

/// One row of the device CSV log. Distance is already in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry {
    pub timestamp: i64,
    pub speed: f64,
    pub distance: i64,
}

impl LogEntry {
    pub fn new(timestamp: i64, speed: f64, distance: i64) -> Self {
        Self {
            timestamp,
            speed,
            distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub distance: f64,
    pub speed: f64,
}

impl ChartPoint {
    pub fn new(distance: f64, speed: f64) -> Self {
        Self { distance, speed }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsvRowError {
    #[error("line {line}: expected 3 columns, found {found}: {content:?}")]
    FieldCount {
        line: usize,
        found: usize,
        content: String,
    },
    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Parsed log plus the rows that had to be dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvLog {
    pub entries: Vec<LogEntry>,
    pub skipped: Vec<CsvRowError>,
}

/// Parse the `timestamp,speed,distance` log served by `/download_csv`.
///
/// Blank lines are discarded before the header is skipped, so the header is
/// the first non-blank line whatever it contains. Bad rows never abort the
/// import; they are collected in [`CsvLog::skipped`] and logged.
pub fn parse_csv(text: &str) -> CsvLog {
    let mut log = CsvLog::default();

    let lines = text
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .skip(1);

    for (idx, line) in lines {
        match parse_row(idx + 1, line) {
            Ok(entry) => log.entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping log row: {}", e);
                log.skipped.push(e);
            }
        }
    }

    log
}

fn parse_row(line_no: usize, line: &str) -> Result<LogEntry, CsvRowError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(CsvRowError::FieldCount {
            line: line_no,
            found: parts.len(),
            content: line.trim_end().to_string(),
        });
    }

    let invalid = |field: &'static str, value: &str| CsvRowError::InvalidField {
        line: line_no,
        field,
        value: value.to_string(),
    };

    let timestamp = parse_whole(parts[0]).ok_or_else(|| invalid("timestamp", parts[0]))?;
    let speed = parts[1]
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| invalid("speed", parts[1]))?;
    let distance = parse_whole(parts[2]).ok_or_else(|| invalid("distance", parts[2]))?;

    Ok(LogEntry::new(timestamp, speed, distance))
}

/// Integer column that may be written with a fraction (`12.0`, `13.7`);
/// the fraction is truncated toward zero.
fn parse_whole(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })
}

/// Stateful single-pass filter deciding which entries are worth plotting.
///
/// A sample is kept when its speed is non-negative and it is either the first
/// kept sample or differs enough in distance or speed from the last kept one.
/// Dropped samples do not move the reference point.
#[derive(Debug, Clone, Default)]
pub struct Downsampler {
    last: Option<ChartPoint>,
}

impl Downsampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, distance: f64, speed: f64) -> Option<ChartPoint> {
        if speed.is_nan() || speed < 0.0 {
            return None;
        }

        let keep = match self.last {
            None => true,
            Some(last) => {
                (distance - last.distance).abs() >= MIN_DISTANCE_DIFF
                    || (speed - last.speed).abs() >= MIN_SPEED_DIFF
            }
        };

        if keep {
            let point = ChartPoint::new(distance, speed);
            self.last = Some(point);
            Some(point)
        } else {
            None
        }
    }
}

pub fn downsample(entries: &[LogEntry]) -> Vec<ChartPoint> {
    let mut sampler = Downsampler::new();
    entries
        .iter()
        .filter_map(|e| sampler.accept(e.distance as f64, e.speed))
        .collect()
}

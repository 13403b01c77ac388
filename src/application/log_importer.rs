// Log importer - fetches the run log and turns it into chart data
use crate::application::device_api::{DeviceApi, DeviceError};
use crate::domain::log::{downsample, parse_csv, ChartPoint, CsvRowError, LogEntry};
use std::sync::Arc;

/// Result of one import. Each import replaces the previous one entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedLog {
    pub entries: Vec<LogEntry>,
    pub points: Vec<ChartPoint>,
    pub skipped: Vec<CsvRowError>,
}

impl ImportedLog {
    pub fn from_csv(text: &str) -> Self {
        let log = parse_csv(text);
        let points = downsample(&log.entries);
        Self {
            entries: log.entries,
            points,
            skipped: log.skipped,
        }
    }
}

#[derive(Clone)]
pub struct LogImporter {
    api: Arc<dyn DeviceApi>,
}

impl LogImporter {
    pub fn new(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    pub async fn import(&self) -> Result<ImportedLog, DeviceError> {
        let csv = self.api.download_log().await?;
        let imported = ImportedLog::from_csv(&csv);

        if imported.entries.is_empty() {
            tracing::warn!("Device returned an empty log, chart will be empty");
        }
        tracing::debug!(
            "Imported {} log entries, {} chart points, {} rows skipped",
            imported.entries.len(),
            imported.points.len(),
            imported.skipped.len()
        );

        Ok(imported)
    }
}

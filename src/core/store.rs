use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Utc};

use crate::domain::model::ProcessedReading;
use crate::domain::ports::ReadingStore;
use crate::utils::error::Result;

/// CSV-backed reading store rooted at a data directory. Layout per machine:
///
///   <machine_id>_sensor_data.csv    every processed reading
///   <machine_id>_alerts.csv         anomalous readings only
///   <machine_id>_latest_alert.json  most recent alert, overwritten in place
#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sensor_data_path(&self, machine_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_sensor_data.csv", machine_id))
    }

    pub fn alerts_path(&self, machine_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}_alerts.csv", machine_id))
    }

    pub fn latest_alert_path(&self, machine_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}_latest_alert.json", machine_id))
    }

    /// Append one row, writing the header only when the file is new.
    /// Each append flushes so a crash loses at most the row in flight.
    fn append_row(&self, path: &Path, reading: &ProcessedReading) -> Result<()> {
        let exists = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);
        writer.serialize(reading)?;
        writer.flush()?;
        Ok(())
    }
}

impl ReadingStore for CsvStore {
    async fn append_reading(&self, reading: &ProcessedReading) -> Result<()> {
        self.append_row(&self.sensor_data_path(&reading.machine_id), reading)
    }

    async fn append_alert(&self, reading: &ProcessedReading) -> Result<()> {
        self.append_row(&self.alerts_path(&reading.machine_id), reading)
    }

    async fn write_latest_alert(&self, reading: &ProcessedReading) -> Result<()> {
        let json = serde_json::to_string_pretty(reading)?;
        fs::write(self.latest_alert_path(&reading.machine_id), json)?;
        Ok(())
    }

    async fn load_history(&self, machine_id: &str, days: i64) -> Result<Vec<ProcessedReading>> {
        let path = self.sensor_data_path(machine_id);
        if !path.exists() {
            tracing::debug!("No data file found for machine {}", machine_id);
            return Ok(Vec::new());
        }

        let cutoff = Utc::now() - TimeDelta::days(days);
        let mut reader = csv::Reader::from_path(&path)?;
        let mut readings = Vec::new();

        for row in reader.deserialize::<ProcessedReading>() {
            let reading = row?;
            match reading.recorded_at() {
                Ok(at) if at >= cutoff => readings.push(reading),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Skipping row with unreadable timestamp '{}': {}",
                        reading.timestamp,
                        e
                    );
                }
            }
        }

        Ok(readings)
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::error::Result;
use crate::utils::monitor::ProcessStats;

/// Backup stamps carry milliseconds so rapid successive snapshots of the
/// same file never collide.
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub current_mean: f64,
    pub previous_mean: f64,
    pub current_std: f64,
    pub previous_std: f64,
}

/// Drift between two snapshots of a monitored CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftMetrics {
    pub timestamp: String,
    pub current_rows: u64,
    pub previous_rows: u64,
    pub rows_changed: u64,
    pub column_stats: BTreeMap<String, ColumnDrift>,
    pub process: Option<ProcessStats>,
}

/// Watches one CSV file: hashes content, keeps timestamped backups of each
/// distinct state, and computes drift statistics between consecutive
/// snapshots.
pub struct CsvMonitor {
    csv_path: PathBuf,
    backup_dir: PathBuf,
    metrics_dir: PathBuf,
    row_alert_threshold: u64,
    last_hash: Option<String>,
}

impl CsvMonitor {
    pub fn new(
        csv_path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        metrics_dir: impl Into<PathBuf>,
        row_alert_threshold: u64,
    ) -> Result<Self> {
        let mut monitor = Self {
            csv_path: csv_path.into(),
            backup_dir: backup_dir.into(),
            metrics_dir: metrics_dir.into(),
            row_alert_threshold,
            last_hash: None,
        };

        fs::create_dir_all(&monitor.backup_dir)?;
        fs::create_dir_all(&monitor.metrics_dir)?;

        monitor.last_hash = monitor.file_hash();
        if monitor.last_hash.is_some() {
            monitor.backup_current()?;
        }

        tracing::info!("Started monitoring CSV: {}", monitor.csv_path.display());
        Ok(monitor)
    }

    /// SHA-256 of the file content, or None when the file is unreadable
    /// (missing files are expected before the agent has written anything).
    fn file_hash(&self) -> Option<String> {
        match fs::read(&self.csv_path) {
            Ok(bytes) => Some(hex::encode(Sha256::digest(&bytes))),
            Err(e) => {
                tracing::warn!("Cannot hash {}: {}", self.csv_path.display(), e);
                None
            }
        }
    }

    fn file_name(&self) -> String {
        self.csv_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data.csv".to_string())
    }

    fn backup_current(&self) -> Result<PathBuf> {
        let stamp = Utc::now().format(BACKUP_STAMP_FORMAT).to_string();
        let backup_path = self
            .backup_dir
            .join(format!("{}.{}", self.file_name(), stamp));
        fs::copy(&self.csv_path, &backup_path)?;
        tracing::info!("Created backup at {}", backup_path.display());
        Ok(backup_path)
    }

    /// Backups of this file, oldest first. Stamps are zero-padded so the
    /// lexicographic sort is chronological.
    fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}.", self.file_name());
        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy().starts_with(&prefix))
                    .unwrap_or(false)
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    /// Check the file once. Returns drift metrics when the content changed
    /// and a previous snapshot exists to compare against.
    pub fn check_once(&mut self) -> Result<Option<DriftMetrics>> {
        let current_hash = match self.file_hash() {
            Some(hash) => hash,
            None => return Ok(None),
        };

        if Some(&current_hash) == self.last_hash.as_ref() {
            return Ok(None);
        }

        tracing::info!("Changes detected in {}", self.csv_path.display());
        self.backup_current()?;
        self.last_hash = Some(current_hash);

        let backups = self.list_backups()?;
        if backups.len() < 2 {
            return Ok(None);
        }

        let previous = &backups[backups.len() - 2];
        let metrics = self.compare_snapshots(previous)?;
        Ok(Some(metrics))
    }

    fn compare_snapshots(&self, previous: &Path) -> Result<DriftMetrics> {
        let current = CsvSnapshot::load(&self.csv_path)?;
        let previous = CsvSnapshot::load(previous)?;

        let mut column_stats = BTreeMap::new();
        for (name, current_col) in current.numeric_columns() {
            if let Some(previous_col) = previous.numeric_column(&name) {
                column_stats.insert(
                    name,
                    ColumnDrift {
                        current_mean: mean(&current_col),
                        previous_mean: mean(&previous_col),
                        current_std: sample_std(&current_col),
                        previous_std: sample_std(&previous_col),
                    },
                );
            }
        }

        Ok(DriftMetrics {
            timestamp: Utc::now().to_rfc3339(),
            current_rows: current.rows as u64,
            previous_rows: previous.rows as u64,
            rows_changed: current.rows.abs_diff(previous.rows) as u64,
            column_stats,
            process: None,
        })
    }

    /// Persist metrics as metrics_<stamp>.json in the metrics directory.
    pub fn save_metrics(&self, metrics: &DriftMetrics) -> Result<PathBuf> {
        let stamp = Utc::now().format(BACKUP_STAMP_FORMAT).to_string();
        let path = self.metrics_dir.join(format!("metrics_{}.json", stamp));
        fs::write(&path, serde_json::to_string_pretty(metrics)?)?;
        tracing::info!("Saved metrics to {}", path.display());
        Ok(path)
    }

    /// True when the row delta crosses the alert threshold.
    pub fn should_alert(&self, metrics: &DriftMetrics) -> bool {
        metrics.rows_changed > self.row_alert_threshold
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Parsed CSV content: header names plus raw cells, column-major access.
struct CsvSnapshot {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
    rows: usize,
}

impl CsvSnapshot {
    fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        }

        let rows = records.len();
        Ok(Self {
            headers,
            records,
            rows,
        })
    }

    /// A column is numeric when it has at least one value and every
    /// non-empty cell parses as f64.
    fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.headers.iter().position(|h| h == name)?;
        let mut values = Vec::new();
        for record in &self.records {
            let cell = record.get(index)?.trim();
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => return None,
            }
        }
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    fn numeric_columns(&self) -> Vec<(String, Vec<f64>)> {
        self.headers
            .iter()
            .filter_map(|name| {
                self.numeric_column(name)
                    .map(|values| (name.clone(), values))
            })
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0.0 for fewer than two
/// values so the metrics stay JSON-representable.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(path: &Path, rows: &[&str]) {
        let mut content = String::from("timestamp,temperature,label\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(path, content).unwrap();
    }

    fn monitor_in(dir: &TempDir) -> (PathBuf, CsvMonitor) {
        let csv_path = dir.path().join("machine-01_sensor_data.csv");
        write_csv(&csv_path, &["2026-08-30 10:00:00,70.0,ok"]);
        let monitor = CsvMonitor::new(
            &csv_path,
            dir.path().join("backups"),
            dir.path().join("metrics"),
            1000,
        )
        .unwrap();
        (csv_path, monitor)
    }

    #[test]
    fn unchanged_file_produces_no_metrics() {
        let dir = TempDir::new().unwrap();
        let (_csv_path, mut monitor) = monitor_in(&dir);

        assert!(monitor.check_once().unwrap().is_none());
    }

    #[test]
    fn change_is_detected_and_compared_to_previous_backup() {
        let dir = TempDir::new().unwrap();
        let (csv_path, mut monitor) = monitor_in(&dir);

        std::thread::sleep(std::time::Duration::from_millis(5));
        write_csv(
            &csv_path,
            &[
                "2026-08-30 10:00:00,70.0,ok",
                "2026-08-30 10:00:01,80.0,ok",
                "2026-08-30 10:00:02,90.0,ok",
            ],
        );

        let metrics = monitor.check_once().unwrap().expect("metrics expected");
        assert_eq!(metrics.previous_rows, 1);
        assert_eq!(metrics.current_rows, 3);
        assert_eq!(metrics.rows_changed, 2);

        let temp = metrics.column_stats.get("temperature").unwrap();
        assert!((temp.current_mean - 80.0).abs() < 1e-9);
        assert!((temp.previous_mean - 70.0).abs() < 1e-9);
        assert!((temp.current_std - 10.0).abs() < 1e-9);
        assert_eq!(temp.previous_std, 0.0);

        // Non-numeric columns are excluded.
        assert!(!metrics.column_stats.contains_key("label"));
        assert!(!metrics.column_stats.contains_key("timestamp"));
    }

    #[test]
    fn second_check_without_change_is_quiet() {
        let dir = TempDir::new().unwrap();
        let (csv_path, mut monitor) = monitor_in(&dir);

        std::thread::sleep(std::time::Duration::from_millis(5));
        write_csv(
            &csv_path,
            &["2026-08-30 10:00:00,70.0,ok", "2026-08-30 10:00:01,80.0,ok"],
        );

        assert!(monitor.check_once().unwrap().is_some());
        assert!(monitor.check_once().unwrap().is_none());
    }

    #[test]
    fn metrics_are_saved_as_json() {
        let dir = TempDir::new().unwrap();
        let (csv_path, mut monitor) = monitor_in(&dir);

        std::thread::sleep(std::time::Duration::from_millis(5));
        write_csv(
            &csv_path,
            &["2026-08-30 10:00:00,70.0,ok", "2026-08-30 10:00:01,80.0,ok"],
        );

        let metrics = monitor.check_once().unwrap().unwrap();
        let path = monitor.save_metrics(&metrics).unwrap();

        let loaded: DriftMetrics =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.rows_changed, 1);
    }

    #[test]
    fn alert_threshold_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let (_csv_path, monitor) = monitor_in(&dir);

        let mut metrics = DriftMetrics {
            timestamp: Utc::now().to_rfc3339(),
            current_rows: 2000,
            previous_rows: 500,
            rows_changed: 1500,
            column_stats: BTreeMap::new(),
            process: None,
        };
        assert!(monitor.should_alert(&metrics));

        metrics.rows_changed = 1000;
        assert!(!monitor.should_alert(&metrics));
    }

    #[test]
    fn missing_file_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut monitor = CsvMonitor::new(
            dir.path().join("never_written.csv"),
            dir.path().join("backups"),
            dir.path().join("metrics"),
            1000,
        )
        .unwrap();

        assert!(monitor.check_once().unwrap().is_none());
    }
}

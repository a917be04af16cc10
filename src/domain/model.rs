use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// Row timestamp format used in the CSV files.
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A raw reading as received from the device (or the mock generator),
/// stamped with the receipt time. Device clocks are not trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub machine_id: String,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub rpm: f64,
    pub timestamp: DateTime<Utc>,
}

/// Predicted failure mode from the rule engine. Serialized names match
/// the historical CSV values, so old data files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    #[serde(rename = "Overheating")]
    Overheating,
    #[serde(rename = "Bearing Failure")]
    BearingFailure,
    #[serde(rename = "Pressure Issue")]
    PressureIssue,
    #[serde(rename = "Motor Issue")]
    MotorIssue,
    #[serde(rename = "Unknown")]
    Unknown,
}

/// One fully processed reading — exactly one CSV row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedReading {
    pub timestamp: String,
    pub machine_id: String,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub rpm: f64,
    pub vibration_to_rpm_ratio: f64,
    pub temperature_pressure_ratio: f64,
    pub temp_anomaly: bool,
    pub vibration_anomaly: bool,
    pub pressure_anomaly: bool,
    pub rpm_anomaly: bool,
    pub anomaly_detected: bool,
    pub failure_probability: Option<f64>,
    #[serde(rename = "failure_type")]
    pub failure_kind: Option<FailureKind>,
}

impl ProcessedReading {
    /// Parse the row timestamp back into a UTC instant.
    pub fn recorded_at(&self) -> Result<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(&self.timestamp, ROW_TIMESTAMP_FORMAT)?;
        Ok(naive.and_utc())
    }
}

/// An inclusive normal operating range for one metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Strictly outside the band on either side counts as anomalous.
    pub fn is_anomalous(&self, value: f64) -> bool {
        value < self.low || value > self.high
    }

    pub fn is_above(&self, value: f64) -> bool {
        value > self.high
    }
}

/// Normal operating ranges for all monitored metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub temperature: Band,
    pub vibration: Band,
    pub pressure: Band,
    pub rpm: Band,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: Band::new(50.0, 90.0),
            vibration: Band::new(0.1, 5.0),
            pressure: Band::new(0.8, 1.2),
            rpm: Band::new(1000.0, 3000.0),
        }
    }
}

/// Per-machine summary over a span of stored readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReport {
    pub machine_id: String,
    pub total_readings: usize,
    pub anomaly_count: usize,
    pub anomaly_percentage: f64,
    pub avg_temperature: f64,
    pub max_temperature: f64,
    pub avg_vibration: f64,
    pub max_vibration: f64,
    pub last_reading_time: String,
}

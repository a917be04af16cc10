use crate::domain::model::{ProcessedReading, SensorReport};
use crate::utils::error::{PdmError, Result};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarize a span of stored readings for one machine. Empty history is an
/// error so callers can distinguish "no data" from a machine that is simply
/// healthy.
pub fn build_report(machine_id: &str, readings: &[ProcessedReading]) -> Result<SensorReport> {
    if readings.is_empty() {
        return Err(PdmError::ProcessingError {
            message: format!("No data available for machine {}", machine_id),
        });
    }

    let total = readings.len();
    let anomaly_count = readings.iter().filter(|r| r.anomaly_detected).count();

    let sum_temp: f64 = readings.iter().map(|r| r.temperature).sum();
    let sum_vib: f64 = readings.iter().map(|r| r.vibration).sum();
    let max_temp = readings.iter().map(|r| r.temperature).fold(f64::MIN, f64::max);
    let max_vib = readings.iter().map(|r| r.vibration).fold(f64::MIN, f64::max);

    // Rows are normally append-ordered, but merged or hand-edited history
    // files may not be; take the maximum timestamp, not the last row.
    let last_reading_time = readings
        .iter()
        .filter_map(|r| r.recorded_at().ok().map(|at| (at, &r.timestamp)))
        .max_by_key(|(at, _)| *at)
        .map(|(_, timestamp)| timestamp.clone())
        .unwrap_or_default();

    Ok(SensorReport {
        machine_id: machine_id.to_string(),
        total_readings: total,
        anomaly_count,
        anomaly_percentage: round2(100.0 * anomaly_count as f64 / total as f64),
        avg_temperature: round2(sum_temp / total as f64),
        max_temperature: round2(max_temp),
        avg_vibration: round2(sum_vib / total as f64),
        max_vibration: round2(max_vib),
        last_reading_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processor::process_reading;
    use crate::domain::model::{SensorReading, Thresholds};
    use chrono::Utc;

    fn processed(temperature: f64, vibration: f64) -> ProcessedReading {
        let raw = SensorReading {
            machine_id: "machine-01".to_string(),
            temperature,
            vibration,
            pressure: 1.0,
            rpm: 2000.0,
            timestamp: Utc::now(),
        };
        process_reading(&raw, &Thresholds::default())
    }

    #[test]
    fn report_aggregates_counts_and_extremes() {
        let readings = vec![
            processed(60.0, 1.0),
            processed(80.0, 3.0),
            processed(95.0, 2.0), // anomalous
            processed(65.0, 2.0),
        ];

        let report = build_report("machine-01", &readings).unwrap();
        assert_eq!(report.total_readings, 4);
        assert_eq!(report.anomaly_count, 1);
        assert_eq!(report.anomaly_percentage, 25.0);
        assert_eq!(report.avg_temperature, 75.0);
        assert_eq!(report.max_temperature, 95.0);
        assert_eq!(report.max_vibration, 3.0);
        assert_eq!(report.avg_vibration, 2.0);
        assert_eq!(report.last_reading_time, readings[3].timestamp);
    }

    #[test]
    fn last_reading_time_is_the_maximum_not_the_last_row() {
        use chrono::TimeZone;

        let stamped = |hour: u32| {
            let raw = SensorReading {
                machine_id: "machine-01".to_string(),
                temperature: 70.0,
                vibration: 1.0,
                pressure: 1.0,
                rpm: 2000.0,
                timestamp: Utc.with_ymd_and_hms(2026, 8, 30, hour, 0, 0).unwrap(),
            };
            process_reading(&raw, &Thresholds::default())
        };

        // Out of order, as a merged history file could be.
        let readings = vec![stamped(9), stamped(14), stamped(11)];

        let report = build_report("machine-01", &readings).unwrap();
        assert_eq!(report.last_reading_time, "2026-08-30 14:00:00");
    }

    #[test]
    fn empty_history_is_an_error() {
        let err = build_report("machine-01", &[]).unwrap_err();
        assert!(err.to_string().contains("No data available"));
    }

    #[test]
    fn report_serializes_to_json() {
        let readings = vec![processed(60.0, 1.0)];
        let report = build_report("machine-01", &readings).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["machine_id"], "machine-01");
        assert_eq!(json["total_readings"], 1);
    }
}

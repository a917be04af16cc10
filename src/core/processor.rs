use crate::domain::model::{
    FailureKind, ProcessedReading, SensorReading, Thresholds, ROW_TIMESTAMP_FORMAT,
};

/// Maximum failure probability the rule engine will report.
const PROBABILITY_CAP: f64 = 0.95;

/// Derive features from a raw reading, flag out-of-range metrics and, when
/// anything is out of range, attach a rule-based failure prediction.
pub fn process_reading(reading: &SensorReading, thresholds: &Thresholds) -> ProcessedReading {
    // Floors keep the ratios defined for stopped machines (rpm 0) and
    // depressurized lines (pressure 0).
    let vibration_to_rpm_ratio = reading.vibration / reading.rpm.max(1.0);
    let temperature_pressure_ratio = reading.temperature / reading.pressure.max(0.1);

    let temp_anomaly = thresholds.temperature.is_anomalous(reading.temperature);
    let vibration_anomaly = thresholds.vibration.is_anomalous(reading.vibration);
    let pressure_anomaly = thresholds.pressure.is_anomalous(reading.pressure);
    let rpm_anomaly = thresholds.rpm.is_anomalous(reading.rpm);

    let anomaly_detected = temp_anomaly || vibration_anomaly || pressure_anomaly || rpm_anomaly;

    let (failure_probability, failure_kind) = if anomaly_detected {
        let (probability, kind) = predict_failure(
            reading,
            thresholds,
            temp_anomaly,
            vibration_anomaly,
            pressure_anomaly,
            rpm_anomaly,
        );
        (Some(probability), Some(kind))
    } else {
        (None, None)
    };

    ProcessedReading {
        timestamp: reading.timestamp.format(ROW_TIMESTAMP_FORMAT).to_string(),
        machine_id: reading.machine_id.clone(),
        temperature: reading.temperature,
        vibration: reading.vibration,
        pressure: reading.pressure,
        rpm: reading.rpm,
        vibration_to_rpm_ratio,
        temperature_pressure_ratio,
        temp_anomaly,
        vibration_anomaly,
        pressure_anomaly,
        rpm_anomaly,
        anomaly_detected,
        failure_probability,
        failure_kind,
    }
}

/// Rule-based fallback predictor. Each contributing condition adds a fixed
/// weight; the first condition to fire (in temperature, vibration, pressure,
/// rpm order) names the failure kind. Over-temperature and over-vibration
/// contribute only above the band; under-range readings of those two metrics
/// still flag an anomaly but carry no weight.
fn predict_failure(
    reading: &SensorReading,
    thresholds: &Thresholds,
    temp_anomaly: bool,
    vibration_anomaly: bool,
    pressure_anomaly: bool,
    rpm_anomaly: bool,
) -> (f64, FailureKind) {
    let mut probability: f64 = 0.0;
    let mut kind = FailureKind::Unknown;

    if temp_anomaly && thresholds.temperature.is_above(reading.temperature) {
        probability += 0.3;
        kind = FailureKind::Overheating;
    }

    if vibration_anomaly && thresholds.vibration.is_above(reading.vibration) {
        probability += 0.4;
        if kind == FailureKind::Unknown {
            kind = FailureKind::BearingFailure;
        }
    }

    if pressure_anomaly {
        probability += 0.2;
        if kind == FailureKind::Unknown {
            kind = FailureKind::PressureIssue;
        }
    }

    if rpm_anomaly {
        probability += 0.1;
        if kind == FailureKind::Unknown {
            kind = FailureKind::MotorIssue;
        }
    }

    (probability.min(PROBABILITY_CAP), kind)
}

use crate::domain::model::Band;
use crate::utils::error::{PdmError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_band(field_name: &str, band: &Band) -> Result<()> {
    if !band.low.is_finite() || !band.high.is_finite() {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: format!("[{}, {}]", band.low, band.high),
            reason: "Range bounds must be finite numbers".to_string(),
        });
    }

    if band.low >= band.high {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: format!("[{}, {}]", band.low, band.high),
            reason: "Lower bound must be below the upper bound".to_string(),
        });
    }

    Ok(())
}

pub fn validate_machine_id(field_name: &str, machine_id: &str) -> Result<()> {
    if machine_id.is_empty() {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: machine_id.to_string(),
            reason: "Machine id cannot be empty".to_string(),
        });
    }

    // Machine ids become file name prefixes, so path separators are out.
    if machine_id.contains('/') || machine_id.contains('\\') {
        return Err(PdmError::InvalidConfigValue {
            field: field_name.to_string(),
            value: machine_id.to_string(),
            reason: "Machine id cannot contain path separators".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(validate_path("data_dir", "").is_err());
        assert!(validate_path("data_dir", "./data").is_ok());
    }

    #[test]
    fn inverted_band_is_rejected() {
        assert!(validate_band("thresholds.temperature", &Band::new(90.0, 50.0)).is_err());
        assert!(validate_band("thresholds.temperature", &Band::new(50.0, 50.0)).is_err());
        assert!(validate_band("thresholds.temperature", &Band::new(50.0, 90.0)).is_ok());
    }

    #[test]
    fn non_finite_band_is_rejected() {
        assert!(validate_band("thresholds.rpm", &Band::new(f64::NAN, 10.0)).is_err());
        assert!(validate_band("thresholds.rpm", &Band::new(0.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn machine_id_with_separator_is_rejected() {
        assert!(validate_machine_id("machine_id", "../etc").is_err());
        assert!(validate_machine_id("machine_id", "").is_err());
        assert!(validate_machine_id("machine_id", "machine-01").is_ok());
    }

    #[test]
    fn positive_number_floor_is_enforced() {
        assert!(validate_positive_number("baud", 0, 1).is_err());
        assert!(validate_positive_number("baud", 9600, 1).is_ok());
    }
}

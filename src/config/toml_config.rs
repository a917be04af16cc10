use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::model::{Band, Thresholds};
use crate::utils::error::Result;
use crate::utils::validation::{validate_band, Validate};

/// Optional TOML file overriding the normal operating ranges, e.g.:
///
/// ```toml
/// [thresholds]
/// temperature = [50.0, 90.0]
/// vibration = [0.1, 5.0]
/// pressure = [0.8, 1.2]
/// rpm = [1000.0, 3000.0]
/// ```
///
/// Omitted metrics keep their built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub thresholds: Option<ThresholdsTable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdsTable {
    pub temperature: Option<[f64; 2]>,
    pub vibration: Option<[f64; 2]>,
    pub pressure: Option<[f64; 2]>,
    pub rpm: Option<[f64; 2]>,
}

impl ThresholdsConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Thresholds> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Thresholds> {
        let config: ThresholdsConfig = toml::from_str(content)?;
        let thresholds = config.into_thresholds();
        thresholds.validate()?;
        Ok(thresholds)
    }

    fn into_thresholds(self) -> Thresholds {
        let defaults = Thresholds::default();
        let table = self.thresholds.unwrap_or_default();

        let band = |range: Option<[f64; 2]>, default: Band| {
            range.map(|[low, high]| Band::new(low, high)).unwrap_or(default)
        };

        Thresholds {
            temperature: band(table.temperature, defaults.temperature),
            vibration: band(table.vibration, defaults.vibration),
            pressure: band(table.pressure, defaults.pressure),
            rpm: band(table.rpm, defaults.rpm),
        }
    }
}

impl Validate for Thresholds {
    fn validate(&self) -> Result<()> {
        validate_band("thresholds.temperature", &self.temperature)?;
        validate_band("thresholds.vibration", &self.vibration)?;
        validate_band("thresholds.pressure", &self.pressure)?;
        validate_band("thresholds.rpm", &self.rpm)?;
        Ok(())
    }
}

use clap::Parser;

use crate::config::toml_config::ThresholdsConfig;
use crate::domain::model::Thresholds;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_machine_id, validate_path, validate_positive_number, Validate,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "pdm-agent")]
#[command(
    about = "Predictive maintenance agent: collects machine sensor readings and flags anomalies"
)]
pub struct CliConfig {
    /// Serial port the sensor device is attached to.
    #[arg(long, env = "ARDUINO_PORT", default_value = "/dev/ttyACM0")]
    pub port: String,

    #[arg(long, default_value = "9600")]
    pub baud: u32,

    /// Directory receiving the per-machine CSV files.
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Machine id used by the mock generator and startup logging.
    #[arg(long, default_value = "machine-01")]
    pub machine_id: String,

    /// Generate synthetic readings instead of opening the serial port.
    #[arg(
        long,
        env = "USE_MOCK_DATA",
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        default_value_t = false,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub mock: bool,

    /// Optional TOML file overriding the normal operating ranges.
    #[arg(long)]
    pub thresholds: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process resource stats during collection")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn load_thresholds(&self) -> Result<Thresholds> {
        match &self.thresholds {
            Some(path) => ThresholdsConfig::from_file(path),
            None => Ok(Thresholds::default()),
        }
    }
}

impl ConfigProvider for CliConfig {
    fn port_path(&self) -> &str {
        &self.port
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }

    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn machine_id(&self) -> &str {
        &self.machine_id
    }

    fn use_mock(&self) -> bool {
        self.mock
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("port", &self.port)?;
        validate_path("data_dir", &self.data_dir)?;
        validate_machine_id("machine_id", &self.machine_id)?;
        validate_positive_number("baud", u64::from(self.baud), 1)?;
        if let Some(path) = &self.thresholds {
            validate_path("thresholds", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployment_contract() {
        let config = CliConfig::parse_from(["pdm-agent"]);
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud, 9600);
        assert_eq!(config.data_dir, "./data");
        assert!(!config.mock);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn mock_flag_accepts_bare_and_valued_forms() {
        assert!(CliConfig::parse_from(["pdm-agent", "--mock"]).mock);
        assert!(CliConfig::parse_from(["pdm-agent", "--mock", "true"]).mock);
        assert!(!CliConfig::parse_from(["pdm-agent", "--mock", "false"]).mock);
    }

    #[test]
    fn zero_baud_fails_validation() {
        let mut config = CliConfig::parse_from(["pdm-agent"]);
        config.baud = 0;
        assert!(config.validate().is_err());
    }
}

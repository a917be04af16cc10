use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdmError {
    #[error("Serial port error: {0}")]
    SerialError(#[from] tokio_serial::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Timestamp parse error: {0}")]
    TimestampError(#[from] chrono::ParseError),

    #[error("Invalid config value for '{field}' ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required config field: {field}")]
    MissingConfig { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Hardware,
    Storage,
    Config,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Degraded but the agent keeps running (e.g. a dropped reading).
    Low,
    /// Recoverable by retry (e.g. serial reconnect in progress).
    Medium,
    /// An operation failed and its data is lost.
    High,
    /// The agent cannot run at all.
    Critical,
}

impl PdmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PdmError::SerialError(_) => ErrorCategory::Hardware,
            PdmError::CsvError(_) | PdmError::IoError(_) => ErrorCategory::Storage,
            PdmError::TomlError(_)
            | PdmError::InvalidConfigValue { .. }
            | PdmError::MissingConfig { .. } => ErrorCategory::Config,
            PdmError::SerializationError(_)
            | PdmError::TimestampError(_)
            | PdmError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PdmError::SerialError(_) => ErrorSeverity::Medium,
            PdmError::CsvError(_) | PdmError::IoError(_) => ErrorSeverity::High,
            PdmError::TomlError(_)
            | PdmError::InvalidConfigValue { .. }
            | PdmError::MissingConfig { .. } => ErrorSeverity::Critical,
            PdmError::SerializationError(_)
            | PdmError::TimestampError(_)
            | PdmError::ProcessingError { .. } => ErrorSeverity::Low,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PdmError::SerialError(_) => {
                "Check that the device is plugged in and the port path matches \
                 ARDUINO_PORT (the agent keeps retrying, or run with --mock)"
                    .to_string()
            }
            PdmError::CsvError(_) => {
                "Inspect the data directory for truncated or hand-edited CSV files".to_string()
            }
            PdmError::IoError(_) => {
                "Check permissions and free space on the data directory".to_string()
            }
            PdmError::SerializationError(_) => {
                "The device sent a malformed frame; verify the firmware output format".to_string()
            }
            PdmError::TomlError(_) => "Fix the syntax of the thresholds file".to_string(),
            PdmError::TimestampError(_) => {
                "A stored row has an unreadable timestamp; it will be skipped".to_string()
            }
            PdmError::InvalidConfigValue { field, .. } => {
                format!("Correct the value of '{}' and restart", field)
            }
            PdmError::MissingConfig { field } => {
                format!("Provide a value for '{}' via flag or environment", field)
            }
            PdmError::ProcessingError { .. } => {
                "Re-run the query once new readings have been collected".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Hardware => format!("Sensor hardware problem: {}", self),
            ErrorCategory::Storage => format!("Data storage problem: {}", self),
            ErrorCategory::Config => format!("Configuration problem: {}", self),
            ErrorCategory::Processing => format!("Processing problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdmError>;

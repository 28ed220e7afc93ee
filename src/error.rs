//! Error types shared by the simulation core, configuration loading, and CSV I/O.

use std::io;

use chrono::{DateTime, FixedOffset};

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.min_soc_percent"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every failure the crate surfaces to its caller.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {}", join_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),

    /// Input timestamps must be strictly ascending.
    #[error("record {index} at {current} does not follow {previous}")]
    UnorderedRecords {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },

    #[error("malformed record on line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error("import series has {imports} intervals but export series has {exports}")]
    SeriesLengthMismatch { imports: usize, exports: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<ConfigError> for SimError {
    fn from(error: ConfigError) -> Self {
        Self::InvalidConfig(vec![error])
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

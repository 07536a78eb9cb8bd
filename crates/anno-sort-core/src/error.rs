use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnoSortError {
    #[error("Target directory does not exist: {path}")]
    TargetNotFound { path: PathBuf },

    #[error("Input file does not exist: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Unknown input encoding: '{label}'")]
    UnknownEncoding { label: String },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Partition error for group '{label}': {source}")]
    Partition {
        label: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[source] csv::Error),

    #[error("Row count mismatch in {path}: read {read}, wrote {written}")]
    RowCountMismatch {
        path: PathBuf,
        read: usize,
        written: usize,
    },

    #[error("{failed} of {total} file(s) failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidConfigValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Home directory not found")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, AnnoSortError>;

impl AnnoSortError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TargetNotFound { .. } | Self::InputNotFound { .. } => 2,
            Self::UnknownEncoding { .. } => 3,
            Self::ConfigParse { .. }
            | Self::ConfigKeyNotFound { .. }
            | Self::InvalidConfigValue { .. } => 4,
            Self::Csv { .. }
            | Self::Partition { .. }
            | Self::Output(_)
            | Self::RowCountMismatch { .. } => 5,
            Self::BatchFailed { .. } => 6,
            _ => 1,
        }
    }
}

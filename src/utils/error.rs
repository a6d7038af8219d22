use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Object store unavailable during {operation}: {message}")]
    StoreUnavailable { operation: String, message: String },

    #[error("Object not found: {bucket}/{name}")]
    ObjectNotFound { bucket: String, name: String },

    #[error("Failed to decompress {name}: {message}")]
    DecompressionFailure { name: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unsupported number of columns {count} on row {row} of {name}")]
    UnsupportedColumnCount { name: String, row: u64, count: usize },

    #[error("Failed to write {name}: {message}")]
    WriteFailure { name: String, message: String },

    #[error("Deadline exceeded during {operation}")]
    Timeout { operation: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Store,
    Data,
    Config,
    System,
}

impl ImporterError {
    pub fn store(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    pub fn write(name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::WriteFailure {
            name: name.into(),
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StoreUnavailable { .. }
            | Self::ObjectNotFound { .. }
            | Self::WriteFailure { .. }
            | Self::Timeout { .. } => ErrorCategory::Store,
            Self::DecompressionFailure { .. }
            | Self::CsvError(_)
            | Self::UnsupportedColumnCount { .. } => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Config,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    /// Process exit code for a run aborted by this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Data => 1,
            ErrorCategory::Store => 2,
            ErrorCategory::System => 3,
            ErrorCategory::Config => 4,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Store => format!("Object store operation failed: {}", self),
            ErrorCategory::Data => format!("Source file could not be processed: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImporterError>;

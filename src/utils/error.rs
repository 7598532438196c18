use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("Empty data list")]
    Empty,

    #[error("Batch size exceeds limit: {count} records (max {limit})")]
    ExceedsLimit { count: usize, limit: usize },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid CSV format: {message}")]
    FormatError { message: String },

    #[error("Missing required columns for {table}: {missing:?}")]
    SchemaError { table: String, missing: Vec<String> },

    #[error("{0}")]
    SizeError(#[from] SizeError),

    #[error("Invalid table name '{name}'. Must be one of: {supported}")]
    UnknownTableError { name: String, supported: String },

    #[error("No valid data found for {table}")]
    EmptyResultError { table: String },

    #[error("Integrity violation: {message}")]
    IntegrityError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schema,
    Storage,
    System,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IngestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestError::FormatError { .. }
            | IngestError::SizeError(_)
            | IngestError::EmptyResultError { .. }
            | IngestError::CsvError(_)
            | IngestError::SerializationError(_) => ErrorCategory::Input,
            IngestError::SchemaError { .. } | IngestError::UnknownTableError { .. } => {
                ErrorCategory::Schema
            }
            IngestError::IntegrityError { .. } | IngestError::StorageError { .. } => {
                ErrorCategory::Storage
            }
            IngestError::IoError(_) => ErrorCategory::System,
            IngestError::ConfigValidationError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Schema => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => match self {
                IngestError::IntegrityError { .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Critical,
            },
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 呼叫端的錯誤（400）或非預期錯誤（500）
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            IngestError::StorageError { .. } | IngestError::IoError(_)
        )
    }

    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            IngestError::StorageError { .. } | IngestError::IoError(_) => {
                "Internal server error".to_string()
            }
            IngestError::EmptyResultError { .. } => "No valid data found".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            IngestError::FormatError { .. } | IngestError::CsvError(_) => {
                "Make sure the file is UTF-8 comma-separated text with the same number of columns on every line"
            }
            IngestError::SchemaError { .. } => {
                "Add the missing columns to the header row, or drop the header so columns are inferred by position"
            }
            IngestError::SizeError(SizeError::Empty) => "Provide at least one record",
            IngestError::SizeError(SizeError::ExceedsLimit { .. }) => {
                "Split the input into smaller batches (max_batch_size, 1000 by default)"
            }
            IngestError::UnknownTableError { .. } => {
                "Use one of: department, job, employee, hired_employee"
            }
            IngestError::EmptyResultError { .. } => {
                "Every row was rejected; run with --verbose to see why each row was dropped"
            }
            IngestError::IntegrityError { .. } => {
                "Remove records that already exist in the store and retry"
            }
            IngestError::StorageError { .. } | IngestError::IoError(_) => {
                "Check that the storage directory exists and is writable"
            }
            IngestError::SerializationError(_) => {
                "Make sure the batch file is a JSON array of objects or {\"data\": [...]}"
            }
            IngestError::ConfigValidationError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. } => {
                "Fix the configuration file and run again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

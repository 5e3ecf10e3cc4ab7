//! Error types for ledgerbook-core
//!
//! Loads fail with [`CoreError::Fetch`], precondition checks with
//! [`CoreError::Validation`], and batch submissions that did not fully land
//! with [`CoreError::PartialWrite`]. None of them is fatal: every error can be
//! turned into [`ErrorDetails`] for reporting.

use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Remote load failed or returned malformed data
    FetchError,
    /// Caller input violated a precondition
    ValidationError,
    /// Some rows of a batch were not saved
    PartialWrite,
    /// Data has not been loaded yet
    NotLoaded,
    /// No roster entry matched a lookup
    StudentNotFound,
    /// Operation not supported by the service
    NotSupported,
    /// Configuration error
    ConfigError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::FetchError => write!(f, "FETCH_ERROR"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::PartialWrite => write!(f, "PARTIAL_WRITE"),
            ErrorCode::NotLoaded => write!(f, "NOT_LOADED"),
            ErrorCode::StudentNotFound => write!(f, "STUDENT_NOT_FOUND"),
            ErrorCode::NotSupported => write!(f, "NOT_SUPPORTED"),
            ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
        }
    }
}

/// Detailed error information for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for ledgerbook-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Fetch failed: {message}")]
    Fetch { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Partial write: {saved} of {attempted} rows saved")]
    PartialWrite { saved: usize, attempted: usize },

    #[error("Ledger not loaded")]
    NotLoaded,

    #[error("Student not found: {query}")]
    StudentNotFound { query: String },

    #[error("Operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation { message: message.into() }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Fetch { .. } => ErrorCode::FetchError,
            CoreError::Validation { .. } => ErrorCode::ValidationError,
            CoreError::PartialWrite { .. } => ErrorCode::PartialWrite,
            CoreError::NotLoaded => ErrorCode::NotLoaded,
            CoreError::StudentNotFound { .. } => ErrorCode::StudentNotFound,
            CoreError::NotSupported { .. } => ErrorCode::NotSupported,
            CoreError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::Fetch { .. } => ErrorSeverity::Error,
            CoreError::Validation { .. } => ErrorSeverity::Warning,
            CoreError::PartialWrite { .. } => ErrorSeverity::Warning,
            CoreError::NotLoaded => ErrorSeverity::Warning,
            CoreError::StudentNotFound { .. } => ErrorSeverity::Info,
            CoreError::NotSupported { .. } => ErrorSeverity::Warning,
            CoreError::Config { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Fetch { message } => {
                details = details.with_detail(serde_json::json!({ "fetch_message": message }));
                details = details.with_suggestion(
                    "Check that service.endpoint is reachable.".to_string()
                );
                details = details.with_suggestion(
                    "Previously loaded data is still shown.".to_string()
                );
            }
            CoreError::Validation { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
            }
            CoreError::PartialWrite { saved, attempted } => {
                details = details.with_detail(serde_json::json!({
                    "saved": saved,
                    "failed": attempted - saved,
                }));
                details = details.with_suggestion(
                    "Balances were reloaded; re-enter only the rows that are missing.".to_string()
                );
            }
            CoreError::StudentNotFound { query } => {
                details = details.with_suggestion(format!(
                    "Use an id or `name|class` exactly as listed by `students` (got '{}').", query
                ));
            }
            CoreError::NotSupported { operation } => {
                details = details.with_suggestion(format!(
                    "Enable a write action for '{}' in service settings.", operation
                ));
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised at the remote service boundary
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Service answered with status {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Service does not support {0}")]
    Unsupported(&'static str),
}

impl From<ledgerbook_config::ConfigError> for CoreError {
    fn from(error: ledgerbook_config::ConfigError) -> Self {
        CoreError::Config { message: error.to_string() }
    }
}

impl From<ServiceError> for CoreError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Unsupported(operation) => CoreError::NotSupported {
                operation: operation.to_string(),
            },
            other => CoreError::Fetch { message: other.to_string() },
        }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let level = match error.severity() {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error | ErrorSeverity::Critical => log::Level::Error,
        };
        log::log!(
            target: "ledgerbook::error",
            level,
            "{} [{}] {} - Operation: {} - Context: {}",
            error.severity().to_string().to_uppercase(),
            error.code(),
            error,
            context.operation,
            context.data
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "ledgerbook::error",
            "WARNING: {} - Operation: {} - Context: {}",
            message,
            context.operation,
            context.data
        );
    }
}

// ==================== Tests ====================

//! Configuration management for ledgerbook
//!
//! This module handles loading, validation, and management of
//! ledgerbook configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Remote ledger service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Web app endpoint that answers `?action=...` requests
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// The service accepts `saveTransactionsBatch`
    #[serde(default = "default_true")]
    pub batch_writes: bool,
    /// The service accepts `saveTransaction`
    #[serde(default = "default_true")]
    pub single_writes: bool,
    /// UTC offset of the spreadsheet's time zone, in minutes
    ///
    /// Date cells come back as UTC timestamps of local midnight; they are
    /// shifted by this offset before the calendar day is taken.
    #[serde(default)]
    pub sheet_utc_offset_minutes: i32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            batch_writes: true,
            single_writes: true,
            sheet_utc_offset_minutes: 0,
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8080/exec".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Currency display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Symbol printed in front of amounts
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Number of decimal places shown
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimal_places: default_decimal_places(),
        }
    }
}

fn default_symbol() -> String {
    "₹".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Report defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    /// Sign filter applied to snapshots when none is given
    #[serde(default)]
    pub default_sign: SignFilter,
    /// Period applied to statements when no bounds are given
    #[serde(default)]
    pub default_period: TimeRange,
}

/// Which transactions a snapshot keeps, by the sign of their net amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignFilter {
    /// Net amount above zero
    Credit,
    /// Net amount below zero
    Debit,
    /// Everything, including zero-net rows
    All,
}

impl Default for SignFilter {
    fn default() -> Self {
        SignFilter::All
    }
}

impl std::str::FromStr for SignFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(SignFilter::Credit),
            "debit" => Ok(SignFilter::Debit),
            "all" | "" => Ok(SignFilter::All),
            _ => Err(format!("Invalid sign filter: {}", s)),
        }
    }
}

impl std::fmt::Display for SignFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignFilter::Credit => write!(f, "credit"),
            SignFilter::Debit => write!(f, "debit"),
            SignFilter::All => write!(f, "all"),
        }
    }
}

/// Named statement periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Current calendar month
    Month,
    /// Current calendar quarter
    Quarter,
    /// Current calendar year
    Year,
    /// No bounds
    All,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::All
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" => Ok(TimeRange::Month),
            "quarter" => Ok(TimeRange::Quarter),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            _ => Err(format!("Invalid time range: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::Month => write!(f, "month"),
            TimeRange::Quarter => write!(f, "quarter"),
            TimeRange::Year => write!(f, "year"),
            TimeRange::All => write!(f, "all"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote service settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Report defaults
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.service.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "service.endpoint".to_string(),
                reason: "Endpoint must start with http:// or https://".to_string(),
            });
        }

        if self.service.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "service.timeout_secs".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if !self.service.batch_writes && !self.service.single_writes {
            return Err(ConfigError::InvalidValue {
                field: "service.batch_writes".to_string(),
                reason: "At least one of batch_writes or single_writes must be enabled".to_string(),
            });
        }

        if self.service.sheet_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                field: "service.sheet_utc_offset_minutes".to_string(),
                reason: "Offset must be less than 24 hours either way".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

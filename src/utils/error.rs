use thiserror::Error;

#[derive(Error, Debug)]
pub enum CellarError {
    #[error("Unknown IANA timezone identifier: {zone}")]
    InvalidTimeZone { zone: String },

    #[error("Invalid time of day: {value} ({reason})")]
    InvalidTimeOfDay { value: String, reason: String },

    #[error("Invalid business-day range: end label {end} precedes start label {start}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Fetch from provider {provider} failed (retryable: {retryable}): {message}")]
    FetchFailed {
        provider: String,
        retryable: bool,
        message: String,
    },

    #[error("Persistence failure: {message}")]
    PersistenceFailed { message: String },

    #[error("Claim {token} was reclaimed by another worker before completion")]
    ClaimLost { token: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Settings parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl CellarError {
    /// Whether a fresh attempt may succeed. Validation errors never retry;
    /// fetch failures carry their own flag from the adapter.
    pub fn is_retryable(&self) -> bool {
        match self {
            CellarError::FetchFailed { retryable, .. } => *retryable,
            CellarError::ApiError(e) => e.is_timeout() || e.is_connect(),
            CellarError::PersistenceFailed { .. } | CellarError::IoError(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CellarError>;

//! Errors of the collection pipeline.

use chrono::{DateTime, Local};
use thiserror::Error;

/// The occupancy source could not produce a count. The tick is aborted,
/// nothing gets persisted.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("occupancy source is unreachable")]
    Unreachable(#[source] reqwest::Error),

    #[error("facility `{0}` is not present on the occupancy page")]
    FacilityMissing(String),

    #[error("invalid occupancy value: {0}")]
    InvalidValue(String),
}

/// The weather provider could not produce a report. The tick continues and
/// the reading is persisted with empty weather columns.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed")]
    Network(#[source] reqwest::Error),

    #[error("weather provider rate limit exceeded")]
    RateLimited,

    #[error("weather provider rejected the API key")]
    Authentication,

    #[error("weather provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected weather response")]
    Malformed(#[source] reqwest::Error),
}

impl WeatherError {
    /// Transient errors are worth another attempt within the same tick,
    /// permanent ones will not succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::Network(_) | WeatherError::RateLimited => true,
            WeatherError::Status(status) => status.is_server_error(),
            WeatherError::Authentication | WeatherError::Malformed(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// A reading with the same tick timestamp is already stored.
    #[error("a reading for {0} is already stored")]
    DuplicateTimestamp(DateTime<Local>),

    #[error("database error")]
    Sqlite(#[from] rusqlite::Error),
}

/// A failure that aborts the whole tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("occupancy could not be read: {0}")]
    Source(#[from] SourceError),

    #[error("reading could not be stored: {0}")]
    Storage(#[from] StorageError),
}

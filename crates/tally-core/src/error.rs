//! Error types for tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("No usable schema: table has no {0} column")]
    NoUsableSchema(&'static str),

    #[error("No date format matched any value in the date column")]
    AllDatesInvalid,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify a reqwest failure against the row store: connection-level
    /// problems become `StoreUnavailable`, a missing range/sheet becomes
    /// `TableNotFound`.
    pub fn from_store_http(err: reqwest::Error, table: &str) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::StoreUnavailable(err.to_string())
        } else if err.status() == Some(reqwest::StatusCode::NOT_FOUND)
            || err.status() == Some(reqwest::StatusCode::BAD_REQUEST)
        {
            Error::TableNotFound(table.to_string())
        } else {
            Error::Http(err)
        }
    }
}

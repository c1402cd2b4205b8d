//! Error type shared by the library API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinancialsError {
    /// A single amount field could not be read as an integer.
    #[error("cannot parse amount {raw:?}")]
    Parse { raw: String },

    #[error("search query must not be empty")]
    InvalidQuery,

    #[error("business year must be four digits, got {year:?}")]
    InvalidYear { year: String },

    #[error("company {corp_code} not found")]
    NotFound { corp_code: String },

    /// The company registry has not been loaded yet.
    #[error("company registry is not loaded")]
    RegistryUnavailable,

    #[error("line item at index {index} is missing or not an object")]
    MalformedRecord { index: usize },

    #[error("company record at index {index} has an empty corp_code")]
    MissingCorpCode { index: usize },

    #[error("duplicate corp_code {corp_code} in company batch")]
    DuplicateCorpCode { corp_code: String },

    #[error("OpenDART error {status}: {message}")]
    Api { status: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinancialsError>;

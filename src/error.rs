use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("No relevant columns found among headers {headers:?}. Expected Query, Page, Position, Clicks or Impressions")]
    NoRelevantColumns { headers: Vec<String> },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedTable {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("Excel error: {0}")]
    Excel(String),
}

impl From<polars::prelude::PolarsError> for CleanerError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        CleanerError::Polars(e.to_string())
    }
}

impl From<calamine::Error> for CleanerError {
    fn from(e: calamine::Error) -> Self {
        CleanerError::Excel(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CleanerError>;

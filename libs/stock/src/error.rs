use chrono::NaiveDate;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum StockError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Throttled by API: {0}")]
    Throttled(String),

    #[error("Response for {symbol} missing 'Time Series (Daily)': {detail}")]
    MissingSeries { symbol: String, detail: String },

    #[error("Can't find data as far back as {since}")]
    NoTradingData { since: NaiveDate },
}

impl StockError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StockError::Http(_) | StockError::Decode(_) | StockError::Throttled(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StockError>;

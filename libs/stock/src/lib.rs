mod alpha_vantage;
mod error;
mod retry;

pub mod daily;
pub mod market;

pub use alpha_vantage::{AlphaVantageClient, DEFAULT_BASE_API, throttle_notice};
pub use daily::{DailyBar, DailyQuote, TimeSeries, percent_change};
pub use error::{Result, StockError};
pub use market::{Bell, MARKET_TZ, is_market_open, market_now};
pub use retry::RetryPolicy;

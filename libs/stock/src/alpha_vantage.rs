use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::daily::{DailyQuote, TimeSeries};
use crate::error::{Result, StockError};
use crate::market::market_now;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_API: &str = "https://www.alphavantage.co/query";

/// Latest 100 sessions, more than the backfill ever needs.
const OUTPUT_SIZE: &str = "compact";

#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_api: String,
    api_key: String,
    retry: RetryPolicy,
}

impl AlphaVantageClient {
    pub fn new(base_api: String, api_key: String) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_api,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs one API function, retrying transport failures and throttling.
    pub async fn query(&self, function: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.retry
            .run(function, move || self.query_once(function, params))
            .await
    }

    async fn query_once(&self, function: &str, params: &[(&str, &str)]) -> Result<Value> {
        let body: Value = self
            .client
            .get(&self.base_api)
            .query(&[
                ("function", function),
                ("apikey", self.api_key.as_str()),
                ("datatype", "json"),
            ])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(notice) = throttle_notice(&body) {
            return Err(StockError::Throttled(notice.to_string()));
        }

        Ok(body)
    }

    #[instrument(name = "time_series_daily", skip(self))]
    pub async fn time_series_daily(&self, symbol: &str) -> Result<TimeSeries> {
        let body = self
            .query(
                "TIME_SERIES_DAILY",
                &[("symbol", symbol), ("outputsize", OUTPUT_SIZE)],
            )
            .await?;

        let series = TimeSeries::from_response(symbol, &body)?;
        debug!(sessions = series.len(), "fetched daily series");
        Ok(series)
    }

    /// Latest session and its change against the one before, as of today in
    /// New York.
    pub async fn daily(&self, symbol: &str) -> Result<DailyQuote> {
        self.daily_as_of(symbol, market_now().date_naive()).await
    }

    pub async fn daily_as_of(&self, symbol: &str, today: NaiveDate) -> Result<DailyQuote> {
        self.time_series_daily(symbol).await?.quote(today)
    }
}

/// Alpha Vantage answers 200 with a notice body when the call budget is spent.
pub fn throttle_notice(body: &Value) -> Option<&str> {
    let note = body
        .get("Note")
        .and_then(Value::as_str)
        .filter(|note| note.contains("call frequency"));

    let information = body
        .get("Information")
        .and_then(Value::as_str)
        .filter(|info| info.contains("rate limit"));

    note.or(information)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::Mutex,
    };

    const THROTTLED: &str = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;

    const SERIES: &str = r#"{
        "Meta Data": {"2. Symbol": "IBM"},
        "Time Series (Daily)": {
            "2024-03-08": {"1. open": "99.0", "2. high": "101.0", "3. low": "98.0", "4. close": "100.0", "5. volume": "10"},
            "2024-03-07": {"1. open": "97.0", "2. high": "99.0", "3. low": "96.0", "4. close": "98.0", "5. volume": "10"}
        }
    }"#;

    /// Serves the canned bodies in order, repeating the last one, and records
    /// each request line.
    async fn stub_server(bodies: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let served = Arc::new(AtomicUsize::new(0));

        let seen_task = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let text = String::from_utf8_lossy(&request);
                let line = text.lines().next().unwrap_or_default().to_string();
                seen_task.lock().await.push(line);

                let index = served.fetch_add(1, Ordering::SeqCst).min(bodies.len() - 1);
                let body = bodies[index];
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/query"), seen)
    }

    fn client(base_api: String) -> AlphaVantageClient {
        AlphaVantageClient::new(base_api, "demo".to_string())
            .unwrap()
            .with_retry(RetryPolicy {
                max_attempts: 3,
                wait: Duration::ZERO,
            })
    }

    #[test]
    fn test_throttle_notice() {
        let note: Value = serde_json::from_str(THROTTLED).unwrap();
        assert!(throttle_notice(&note).is_some());

        let info = json!({ "Information": "You have reached the standard API rate limit of 25 requests per day." });
        assert!(throttle_notice(&info).is_some());

        let other = json!({ "Note": "Something unrelated" });
        assert!(throttle_notice(&other).is_none());
        assert!(throttle_notice(&json!({})).is_none());
    }

    #[tokio::test]
    async fn test_retries_through_throttling() {
        let (url, seen) = stub_server(vec![THROTTLED, SERIES]).await;

        let quote = client(url)
            .daily_as_of("IBM", NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
            .await
            .unwrap();

        assert_eq!(quote.close, 100.0);
        assert_eq!(quote.previous_close, 98.0);

        let seen = seen.lock().await;
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("function=TIME_SERIES_DAILY"));
        assert!(seen[0].contains("apikey=demo"));
        assert!(seen[0].contains("symbol=IBM"));
        assert!(seen[0].contains("outputsize=compact"));
    }

    #[tokio::test]
    async fn test_gives_up_when_always_throttled() {
        let (url, seen) = stub_server(vec![THROTTLED]).await;

        let err = client(url)
            .time_series_daily("IBM")
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::Throttled(_)));
        assert_eq!(seen.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_not_retried() {
        let (url, seen) =
            stub_server(vec![r#"{"Error Message": "Invalid API call."}"#]).await;

        let err = client(url)
            .time_series_daily("NOPE")
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::MissingSeries { .. }));
        assert_eq!(seen.lock().await.len(), 1);
    }
}

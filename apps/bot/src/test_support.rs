use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Duration as ChronoDuration;
use serde_json::{Map, json};
use stock::{AlphaVantageClient, RetryPolicy, market_now};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

use crate::Data;
use crate::config::{Config, Stock};

const UNKNOWN_SYMBOL: &str = r#"{"Error Message": "Invalid API call."}"#;

/// Two sessions, yesterday and today in New York, so `daily()` resolves
/// whatever day the tests run on.
pub fn series(open: f64, close: f64, previous_close: f64) -> String {
    let today = market_now().date_naive();
    let yesterday = today - ChronoDuration::days(1);

    let bar = |open: f64, close: f64| {
        json!({
            "1. open": open.to_string(),
            "2. high": close.max(open).to_string(),
            "3. low": close.min(open).to_string(),
            "4. close": close.to_string(),
            "5. volume": "1000",
        })
    };

    let mut sessions = Map::new();
    sessions.insert(today.format("%Y-%m-%d").to_string(), bar(open, close));
    sessions.insert(
        yesterday.format("%Y-%m-%d").to_string(),
        bar(previous_close, previous_close),
    );

    json!({ "Time Series (Daily)": sessions }).to_string()
}

/// Answers by the `symbol=` query parameter; anything unlisted gets the API's
/// invalid-call body. Returns the base URL and the symbols requested so far.
pub async fn stub_api(routes: HashMap<&'static str, String>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requested = Arc::new(Mutex::new(Vec::new()));

    let requested_task = Arc::clone(&requested);
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
            let line = text.lines().next().unwrap_or_default();
            let symbol = line
                .split(['?', '&', ' '])
                .find_map(|param| param.strip_prefix("symbol="))
                .unwrap_or_default()
                .to_string();

            let body = routes
                .get(symbol.as_str())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());
            requested_task.lock().await.push(symbol);

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}/query"), requested)
}

pub fn stock(symbol: &str, name: &str) -> Stock {
    Stock {
        symbol: symbol.to_string(),
        name: name.to_string(),
    }
}

pub fn data(api_url: String, stocks: Vec<Stock>) -> Data {
    let config = Config {
        discord_token: "token".to_string(),
        version: "test".to_string(),
        api_key: "demo".to_string(),
        api_url: api_url.clone(),
        channels: vec![1],
        stocks,
        relay_bots: Vec::new(),
    };

    let client = AlphaVantageClient::new(api_url, "demo".to_string())
        .unwrap()
        .with_retry(RetryPolicy {
            max_attempts: 3,
            wait: Duration::ZERO,
        });

    Data::new(config, client)
}

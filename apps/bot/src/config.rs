use std::env::var;

use anyhow::{Context as _, Result, bail, ensure};
use stock::DEFAULT_BASE_API;
use tracing::warn;

use crate::relay::RelayBot;

/// Alpha Vantage's free tier allows 5 calls a minute, one per stock per tick.
pub const MAX_STOCKS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub version: String,
    pub api_key: String,
    pub api_url: String,
    pub channels: Vec<u64>,
    pub stocks: Vec<Stock>,
    pub relay_bots: Vec<RelayBot>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} not set"))
        };

        let config = Self {
            discord_token: required("DISCORD_TOKEN")?,
            version: lookup("APP_VERSION").unwrap_or_else(|| "Unknown".to_string()),
            api_key: required("ALPHA_VANTAGE_API_KEY")?,
            api_url: lookup("ALPHA_VANTAGE_URL").unwrap_or_else(|| DEFAULT_BASE_API.to_string()),
            channels: parse_channels(&lookup("TICKER_CHANNEL_IDS").unwrap_or_default())?,
            stocks: parse_stocks(&lookup("TICKER_STOCKS").unwrap_or_default())?,
            relay_bots: parse_relay_bots(&lookup("TICKER_RELAY_BOTS").unwrap_or_default())?,
        };

        if config.channels.is_empty() {
            warn!("No channels for ticker defined in config -- ticker will be disabled");
        }
        if config.stocks.is_empty() {
            warn!("No stocks for ticker defined in config -- ticker will be disabled");
        }

        Ok(config)
    }

    pub fn ticker_enabled(&self) -> bool {
        !self.channels.is_empty() && !self.stocks.is_empty()
    }

    pub fn is_relay_bot(&self, id: u64, name: &str) -> bool {
        self.relay_bots.iter().any(|bot| bot.matches(id, name))
    }
}

fn entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_channels(raw: &str) -> Result<Vec<u64>> {
    entries(raw)
        .map(|id| {
            id.parse::<u64>()
                .with_context(|| format!("invalid channel id in TICKER_CHANNEL_IDS: {id}"))
        })
        .collect()
}

/// `AAPL:Apple,MSFT:Microsoft`. Order is kept for the ticker line.
fn parse_stocks(raw: &str) -> Result<Vec<Stock>> {
    let mut stocks: Vec<Stock> = Vec::new();

    for entry in entries(raw) {
        let Some((symbol, name)) = entry.split_once(':') else {
            bail!("invalid entry in TICKER_STOCKS, expected SYMBOL:Name: {entry}");
        };

        let symbol = symbol.trim().to_uppercase();
        ensure!(
            !symbol.is_empty() && symbol.chars().all(|c| c.is_ascii_alphabetic()),
            "invalid symbol in TICKER_STOCKS: {entry}"
        );

        if stocks.iter().any(|s| s.symbol == symbol) {
            warn!(symbol = %symbol, "duplicate stock in TICKER_STOCKS ignored");
            continue;
        }

        stocks.push(Stock {
            symbol,
            name: name.trim().to_string(),
        });
    }

    ensure!(
        stocks.len() <= MAX_STOCKS,
        "No more than {MAX_STOCKS} stocks may be present in ticker config"
    );

    Ok(stocks)
}

fn parse_relay_bots(raw: &str) -> Result<Vec<RelayBot>> {
    entries(raw).map(str::parse::<RelayBot>).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [("DISCORD_TOKEN", "token"), ("ALPHA_VANTAGE_API_KEY", "key")];

    #[test]
    fn test_full_config() {
        let mut vars = BASE.to_vec();
        vars.extend([
            ("TICKER_CHANNEL_IDS", "111, 222"),
            ("TICKER_STOCKS", "msft:Microsoft, AAPL:Apple Inc."),
            ("TICKER_RELAY_BOTS", "bridge@42,@7"),
        ]);

        let config = load(&vars).unwrap();
        assert_eq!(config.channels, vec![111, 222]);
        assert_eq!(
            config.stocks,
            vec![
                Stock {
                    symbol: "MSFT".into(),
                    name: "Microsoft".into()
                },
                Stock {
                    symbol: "AAPL".into(),
                    name: "Apple Inc.".into()
                },
            ]
        );
        assert_eq!(config.api_url, DEFAULT_BASE_API);
        assert!(config.ticker_enabled());
        assert!(config.is_relay_bot(42, "bridge"));
        assert!(config.is_relay_bot(7, "anyone"));
        assert!(!config.is_relay_bot(42, "imposter"));
    }

    #[test]
    fn test_missing_api_key() {
        let err = load(&[("DISCORD_TOKEN", "token")]).unwrap_err();
        assert!(err.to_string().contains("ALPHA_VANTAGE_API_KEY"));
    }

    #[test]
    fn test_too_many_stocks() {
        let mut vars = BASE.to_vec();
        vars.push(("TICKER_STOCKS", "A:a,B:b,C:c,D:d,E:e,F:f"));

        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_empty_ticker_is_disabled_not_fatal() {
        let config = load(&BASE).unwrap();
        assert!(config.channels.is_empty());
        assert!(config.stocks.is_empty());
        assert!(!config.ticker_enabled());
    }

    #[test]
    fn test_rejects_malformed_entries() {
        let mut vars = BASE.to_vec();
        vars.push(("TICKER_STOCKS", "AAPL"));
        assert!(load(&vars).is_err());

        let mut vars = BASE.to_vec();
        vars.push(("TICKER_CHANNEL_IDS", "general"));
        assert!(load(&vars).is_err());
    }
}

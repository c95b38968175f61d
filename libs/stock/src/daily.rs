use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Result, StockError};

/// How many calendar days before a date we look for a trading session.
pub const MAX_LOOKBACK_DAYS: i64 = 5;

const SERIES_KEY: &str = "Time Series (Daily)";

pub fn percent_change(new_value: f64, old_value: f64) -> f64 {
    new_value / old_value * 100.0 - 100.0
}

//
// Match Alpha Vantage TIME_SERIES_DAILY JSON
// https://www.alphavantage.co/documentation/#daily
//
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct DailyBar {
    #[serde(rename = "1. open", deserialize_with = "from_str_f64")]
    pub open: f64,

    #[serde(rename = "2. high", deserialize_with = "from_str_f64")]
    pub high: f64,

    #[serde(rename = "3. low", deserialize_with = "from_str_f64")]
    pub low: f64,

    #[serde(rename = "4. close", deserialize_with = "from_str_f64")]
    pub close: f64,

    #[serde(rename = "5. volume", deserialize_with = "from_str_f64")]
    pub volume: f64,
}

fn from_str_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Default)]
pub struct TimeSeries(BTreeMap<NaiveDate, DailyBar>);

impl TimeSeries {
    /// Pulls the daily series out of a raw API response.
    pub fn from_response(symbol: &str, body: &Value) -> Result<Self> {
        let Some(series) = body.get(SERIES_KEY) else {
            let detail = body
                .get("Error Message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string());

            return Err(StockError::MissingSeries {
                symbol: symbol.to_string(),
                detail,
            });
        };

        let bars = BTreeMap::<NaiveDate, DailyBar>::deserialize(series)?;
        Ok(Self(bars))
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyBar> {
        self.0.get(&date)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Walks back from `date` one calendar day at a time, at most `lookback`
    /// days, and returns the first session present.
    pub fn latest_on_or_before(
        &self,
        date: NaiveDate,
        lookback: i64,
    ) -> Option<(NaiveDate, &DailyBar)> {
        (0..=lookback)
            .map(|back| date - Duration::days(back))
            .find_map(|day| self.get(day).map(|bar| (day, bar)))
    }

    /// Finds the session for `today` (which may really be Friday on a weekend,
    /// or yesterday before the open) and the session before it.
    pub fn quote(&self, today: NaiveDate) -> Result<DailyQuote> {
        let (date, current) = self
            .latest_on_or_before(today, MAX_LOOKBACK_DAYS)
            .ok_or(StockError::NoTradingData {
                since: today - Duration::days(MAX_LOOKBACK_DAYS),
            })?;

        let day_before = date - Duration::days(1);
        let (previous_date, previous) = self
            .latest_on_or_before(day_before, MAX_LOOKBACK_DAYS)
            .ok_or(StockError::NoTradingData {
                since: day_before - Duration::days(MAX_LOOKBACK_DAYS),
            })?;

        Ok(DailyQuote {
            date,
            previous_date,
            open: current.open,
            close: current.close,
            previous_close: previous.close,
            percentage: percent_change(current.close, previous.close),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub previous_date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub previous_close: f64,
    /// Close relative to the previous session's close.
    pub percentage: f64,
}

impl DailyQuote {
    pub fn current(&self) -> f64 {
        self.close
    }
}

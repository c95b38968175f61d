//! What the scheduled job says: the ticker line and the prediction results at
//! each bell. Sending is left to the caller.

use std::sync::Arc;

use serenity::futures::{StreamExt, stream};
use stock::{Bell, DailyQuote};
use tracing::{error, info, warn};
use tracing_futures::Instrument;

use crate::Data;
use crate::config::{MAX_STOCKS, Stock};
use crate::format::{closest_line, prediction_error, prediction_result, ticker_entry, ticker_line};
use crate::prediction::{Prediction, closest};

/// Every configured stock is fetched at once; there are never more than five.
const CONCURRENCY: usize = MAX_STOCKS;

/// Daily quotes for every configured stock, in configured order.
pub async fn fetch_ticker(data: &Data) -> Vec<(&Stock, stock::Result<DailyQuote>)> {
    stream::iter(data.config.stocks.iter())
        .map(|stock| {
            let client = Arc::clone(&data.client);
            let span = tracing::info_span!("ticker_symbol", symbol = %stock.symbol);

            async move { (stock, client.daily(&stock.symbol).await) }.instrument(span)
        })
        .buffered(CONCURRENCY)
        .boxed()
        .collect()
        .await
}

/// One line for the stocks that resolved; `None` when none did.
pub fn ticker_message(results: &[(&Stock, stock::Result<DailyQuote>)]) -> Option<String> {
    let entries: Vec<String> = results
        .iter()
        .filter_map(|(stock, result)| match result {
            Ok(quote) => Some(ticker_entry(&stock.name, &stock.symbol, quote.percentage)),
            Err(e) => {
                error!(symbol = %stock.symbol, error = %e, "Error fetching symbol for ticker -- skipping");
                None
            }
        })
        .collect();

    if entries.is_empty() {
        warn!("no symbols fetched, ticker not sent");
        return None;
    }

    info!(sent = entries.len(), total = results.len(), "ticker ready");
    Some(ticker_line(&entries))
}

/// One result line per prediction then the closest guess, or the error line
/// when the symbol could not be fetched.
pub fn prediction_report(
    symbol: &str,
    predictions: &[Prediction],
    bell: Bell,
    quote: &stock::Result<DailyQuote>,
) -> Vec<String> {
    let quote = match quote {
        Ok(quote) => quote,
        Err(e) => {
            error!(symbol, error = %e, "Failed to fetch information for symbol -- skipping");
            return vec![prediction_error(symbol)];
        }
    };

    let actual = bell.price(quote);
    let mut lines: Vec<String> = predictions
        .iter()
        .map(|prediction| prediction_result(symbol, prediction, bell, actual))
        .collect();

    if let Some(winner) = closest(predictions, actual) {
        info!(symbol, nick = %winner.nick, count = predictions.len(), "closest prediction");
        lines.push(closest_line(symbol, winner, predictions.len(), actual));
    }

    lines
}

/// Fetches the symbol and scores its predictions against the bell's price.
pub async fn score_symbol(
    data: &Data,
    symbol: &str,
    predictions: &[Prediction],
    bell: Bell,
) -> Vec<String> {
    let quote = data.client.daily(symbol).await;
    prediction_report(symbol, predictions, bell, &quote)
}

use chrono::DateTime;
use chrono_tz::Tz;
use stock::{Bell, market_now};
use tracing::{debug, info, instrument, warn};

use crate::format::{prediction_placed, prediction_usage, unknown_symbol};
use crate::prediction::{Prediction, parse_percent, target_price};
use crate::relay::parse_symbol;
use crate::{Context, Data, Error};

#[poise::command(slash_command)]
pub async fn predict(
    ctx: Context<'_>,
    #[description = "Ticker symbol (e.g., AAPL)"] symbol: String,
    #[description = "Expected move at the next open or close (e.g., +1.5%)"] change: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let nick = ctx.author().name.clone();
    info!(
        "predict: invoked nick={} symbol={} change={}",
        nick, symbol, change
    );

    let reply = match parse_percent(&change) {
        Some(percent) => predict_reply(ctx.data(), &nick, &symbol, percent, market_now()).await,
        None => prediction_usage(&nick),
    };
    ctx.say(reply).await?;

    Ok(())
}

/// Records a guess for the next bell. While the market is open the guess is
/// measured from today's open and targets the close; otherwise from the last
/// close, targeting the next open.
#[instrument(name = "predict", skip(data, now))]
pub async fn predict_reply(
    data: &Data,
    nick: &str,
    symbol: &str,
    percent: f64,
    now: DateTime<Tz>,
) -> String {
    let Some(symbol) = parse_symbol(symbol.trim()) else {
        return unknown_symbol(nick);
    };

    let quote = match data.client.daily(&symbol).await {
        Ok(quote) => quote,
        Err(e) => {
            warn!(error = %e, "Error trying to look up symbol for prediction");
            return unknown_symbol(nick);
        }
    };

    let base_bell = Bell::current(&now);
    let base = base_bell.price(&quote);
    let prediction = Prediction {
        nick: nick.to_string(),
        set_at: now,
        base,
        target: target_price(base, percent),
    };

    let replaced = data
        .predictions
        .lock()
        .await
        .insert(&symbol, prediction.clone());
    debug!(
        base,
        target = prediction.target,
        replaced = replaced.is_some(),
        "prediction saved"
    );

    prediction_placed(&symbol, &prediction, base_bell.next(), replaced.as_ref())
}

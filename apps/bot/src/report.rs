use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use serenity::all::{ChannelId, CreateMessage, Http};
use stock::{Bell, is_market_open};
use ticker::Data;
use ticker::digest::{fetch_ticker, score_symbol, ticker_message};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Buffer after the ticker before spending more API calls (5 per minute).
const PREDICTION_DELAY: Duration = Duration::from_secs(60);

/// At most four symbols a minute while scoring predictions.
const PREDICTION_SPACING: Duration = Duration::from_secs(15);

#[instrument(name = "tick", skip(http, data), fields(at = %now))]
pub async fn run_tick(http: Arc<Http>, data: Data, now: DateTime<Tz>) -> Result<()> {
    if is_market_open(&now) && data.config.ticker_enabled() {
        send_ticker(&http, &data).await;
    } else {
        debug!("market closed or ticker disabled, skipping ticker");
    }

    if let Some(bell) = Bell::at(&now) {
        info!(bell = bell.as_str(), "market bell, scoring predictions shortly");
        sleep(PREDICTION_DELAY).await;
        report_predictions(&http, &data, bell).await;
    }

    Ok(())
}

async fn send_ticker(http: &Arc<Http>, data: &Data) {
    let results = fetch_ticker(data).await;
    if let Some(line) = ticker_message(&results) {
        broadcast(http, data, &line).await;
    }
}

/// Scores every pending prediction against the bell's price, then clears them.
#[instrument(name = "report_predictions", skip(http, data))]
async fn report_predictions(http: &Arc<Http>, data: &Data, bell: Bell) {
    let book = data.predictions.lock().await.take();
    if book.is_empty() {
        info!("no predictions to score");
        return;
    }

    for (index, (symbol, predictions)) in book.iter().enumerate() {
        if index > 0 {
            sleep(PREDICTION_SPACING).await;
        }

        for line in score_symbol(data, symbol, predictions, bell).await {
            broadcast(http, data, &line).await;
        }
    }

    info!(symbols = book.len(), "predictions scored");
}

async fn broadcast(http: &Arc<Http>, data: &Data, text: &str) {
    for &channel in &data.config.channels {
        let channel = ChannelId::new(channel);
        if let Err(e) = channel
            .send_message(http, CreateMessage::new().content(text))
            .await
        {
            warn!(channel_id = %channel, error = ?e, "send failed");
        }
    }
}

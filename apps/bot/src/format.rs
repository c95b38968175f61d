use chrono::DateTime;
use chrono_tz::Tz;
use stock::{Bell, DailyQuote, percent_change};

use crate::prediction::Prediction;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

pub fn colorize(percentage: f64) -> String {
    if percentage > 0.0 {
        format!("🟢 +{percentage:.2}%")
    } else {
        format!("🔴 {percentage:.2}%")
    }
}

fn timestamp(at: &DateTime<Tz>) -> String {
    at.format(TIME_FORMAT).to_string()
}

pub fn ticker_entry(name: &str, symbol: &str, change: f64) -> String {
    format!("{name} (**{symbol}**): {}", colorize(change))
}

pub fn ticker_line(entries: &[String]) -> String {
    entries.join(" | ")
}

pub fn check_line(symbol: &str, quote: &DailyQuote) -> String {
    format!(
        "Symbol: **{symbol}** | Current: {:.2} | Daily Change: {}",
        quote.current(),
        colorize(quote.percentage)
    )
}

pub fn unknown_symbol(nick: &str) -> String {
    format!("{nick}: Is your symbol correct?")
}

pub fn prediction_usage(nick: &str) -> String {
    format!("{nick}: Predictions look like `!predict AAPL +1.5%`.")
}

pub fn prediction_placed(
    symbol: &str,
    prediction: &Prediction,
    target_bell: Bell,
    replaced: Option<&Prediction>,
) -> String {
    let mut line = format!(
        "Prediction by {} for **{symbol}** at market {}: {:.2} ({})",
        prediction.nick,
        target_bell.as_str(),
        prediction.target,
        colorize(percent_change(prediction.target, prediction.base)),
    );

    if let Some(old) = replaced {
        line.push_str(&format!(
            " (replaces old prediction of {:.2} ({}) set at {})",
            old.target,
            colorize(percent_change(old.target, old.base)),
            timestamp(&old.set_at),
        ));
    }

    line
}

pub fn prediction_result(symbol: &str, prediction: &Prediction, bell: Bell, actual: f64) -> String {
    format!(
        "Prediction by {} for **{symbol}**: {:.2} ({}). Actual value at {}: {:.2} ({}). Prediction set at {}.",
        prediction.nick,
        prediction.target,
        colorize(percent_change(prediction.target, prediction.base)),
        bell.as_str(),
        actual,
        colorize(percent_change(actual, prediction.base)),
        timestamp(&prediction.set_at),
    )
}

pub fn closest_line(symbol: &str, winner: &Prediction, count: usize, actual: f64) -> String {
    format!(
        "{} had the closest guess for **{symbol}** out of {count} predictions with a prediction of {:.2} ({}).",
        winner.nick,
        winner.target,
        colorize(percent_change(winner.target, actual)),
    )
}

pub fn prediction_error(symbol: &str) -> String {
    format!("Error with predictions for symbol {symbol}.")
}

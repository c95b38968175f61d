use std::{collections::BTreeMap, mem::take};

use chrono::DateTime;
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub nick: String,
    pub set_at: DateTime<Tz>,
    /// Session price the guess was made against.
    pub base: f64,
    pub target: f64,
}

/// Pending guesses, symbol -> one prediction per nick in the order placed.
#[derive(Debug, Default)]
pub struct PredictionBook {
    by_symbol: BTreeMap<String, Vec<Prediction>>,
}

impl PredictionBook {
    /// Stores the guess, handing back the nick's previous one for this symbol.
    pub fn insert(&mut self, symbol: &str, prediction: Prediction) -> Option<Prediction> {
        let predictions = self.by_symbol.entry(symbol.to_string()).or_default();

        match predictions.iter_mut().find(|p| p.nick == prediction.nick) {
            Some(existing) => Some(std::mem::replace(existing, prediction)),
            None => {
                predictions.push(prediction);
                None
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, symbol: &str) -> &[Prediction] {
        self.by_symbol.get(symbol).map(Vec::as_slice).unwrap_or_default()
    }

    /// Empties the book for a report cycle.
    pub fn take(&mut self) -> BTreeMap<String, Vec<Prediction>> {
        take(&mut self.by_symbol)
    }
}

/// Smallest miss wins; ties go to whoever guessed first.
pub fn closest(predictions: &[Prediction], actual: f64) -> Option<&Prediction> {
    predictions.iter().fold(None, |best: Option<&Prediction>, p| match best {
        Some(b) if (actual - b.target).abs() <= (actual - p.target).abs() => Some(b),
        _ => Some(p),
    })
}

pub fn target_price(base: f64, percent: f64) -> f64 {
    base + base * percent * 0.01
}

/// `5%`, `+5%`, `-2.5%`.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let number = raw.trim().strip_suffix('%')?;
    let (negative, digits) = match number.as_bytes().first()? {
        b'-' => (true, &number[1..]),
        b'+' => (false, &number[1..]),
        _ => (false, number),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || fraction.is_some_and(|f| !all_digits(f)) {
        return None;
    }

    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::{America::New_York, Tz};

use crate::daily::DailyQuote;

pub const MARKET_TZ: Tz = New_York;

pub fn market_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&MARKET_TZ)
}

/// Regular session, weekdays 09:30 through 16:00. Holidays are not known.
pub fn is_market_open(now: &DateTime<Tz>) -> bool {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let (hour, minute) = (now.hour(), now.minute());
    let closed = hour < 9
        || hour >= 17
        || (hour == 9 && minute < 30)
        || (hour == 16 && minute > 0);

    !closed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bell {
    Open,
    Close,
}

impl Bell {
    /// The bell ringing at exactly this minute, if any.
    pub fn at(now: &DateTime<Tz>) -> Option<Bell> {
        match (now.hour(), now.minute()) {
            (9, 30) => Some(Bell::Open),
            (16, 0) => Some(Bell::Close),
            _ => None,
        }
    }

    /// The session price prices are measured against right now.
    pub fn current(now: &DateTime<Tz>) -> Bell {
        if is_market_open(now) {
            Bell::Open
        } else {
            Bell::Close
        }
    }

    pub fn next(self) -> Bell {
        match self {
            Bell::Open => Bell::Close,
            Bell::Close => Bell::Open,
        }
    }

    pub fn price(self, quote: &DailyQuote) -> f64 {
        match self {
            Bell::Open => quote.open,
            Bell::Close => quote.close,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bell::Open => "open",
            Bell::Close => "close",
        }
    }
}

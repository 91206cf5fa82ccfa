use crate::constants::{MARKET_TIMEZONE, SESSION_CLOSE, SESSION_OPEN};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Source of the market open/closed state
pub trait MarketHours: Send + Sync {
    fn is_open(&self) -> bool;
}

pub type SharedMarketHours = Arc<dyn MarketHours>;

/// Trading session configuration for the NSE cash market.
///
/// Weekends and exchange holidays are not considered: any day whose local
/// time falls inside the session counts as open.
#[derive(Debug, Clone)]
pub struct TradingHours {
    pub open: (u32, u32),         // (9, 15) for 9:15am
    pub close: (u32, u32),        // (15, 30) for 3:30pm
    pub timezone: &'static str,   // "Asia/Kolkata"
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            open: SESSION_OPEN,
            close: SESSION_CLOSE,
            timezone: MARKET_TIMEZONE,
        }
    }
}

impl TradingHours {
    fn tz(&self) -> Option<Tz> {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(e) => {
                tracing::warn!("Failed to parse timezone '{}': {}", self.timezone, e);
                None
            }
        }
    }

    /// Whether `now` falls inside the session, both ends inclusive
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        // Treat an unparseable timezone as closed
        let Some(tz) = self.tz() else {
            return false;
        };
        let (Some(open), Some(close)) = (
            NaiveTime::from_hms_opt(self.open.0, self.open.1, 0),
            NaiveTime::from_hms_opt(self.close.0, self.close.1, 0),
        ) else {
            return false;
        };

        let local = now.with_timezone(&tz).time();
        local >= open && local <= close
    }

    /// Today's date on the exchange calendar
    pub fn today(&self) -> NaiveDate {
        let now = Utc::now();
        match self.tz() {
            Some(tz) => now.with_timezone(&tz).date_naive(),
            None => now.date_naive(),
        }
    }
}

impl MarketHours for TradingHours {
    fn is_open(&self) -> bool {
        self.is_open_at(Utc::now())
    }
}

/// Get appropriate cache control max-age for live widgets
///
/// Market open: 15 seconds (matches the dashboard polling interval)
/// Market closed: 120 seconds (values are frozen anyway)
pub fn get_cache_max_age(market_open: bool) -> u32 {
    if market_open {
        15
    } else {
        120
    }
}

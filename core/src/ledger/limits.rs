//! # Spend-Limit Windows
//!
//! Wallets cap how much value may move in a calendar day and a calendar
//! month. A window is anchored at the service's reference clock: the daily
//! window opens at midnight of the current date, the monthly window at
//! midnight on the first of the current month. Rolling backwards-from-now
//! windows were considered and rejected — calendar anchoring is what the
//! product communicates to users ("your daily limit resets at midnight").
//!
//! The rule itself is one comparison: a candidate amount is allowed when
//! `period_total + candidate <= limit`. Summing the period total is the
//! store's job ([`crate::store::LedgerStore::period_total`]); deposits and
//! withdrawals accumulate against separate totals, keyed by
//! [`Direction`](super::transaction::Direction).

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config;

// ---------------------------------------------------------------------------
// LimitWindow
// ---------------------------------------------------------------------------

/// The two enforcement windows every wallet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitWindow {
    /// Resets at midnight of the current date.
    Daily,
    /// Resets at midnight on the first of the current month.
    Monthly,
}

impl LimitWindow {
    /// Both windows, in checking order.
    pub const BOTH: [LimitWindow; 2] = [LimitWindow::Daily, LimitWindow::Monthly];

    /// The instant this window opened, relative to `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let date = match self {
            LimitWindow::Daily => now.date_naive(),
            // with_day(1) is valid for every date.
            LimitWindow::Monthly => now.date_naive().with_day(1).unwrap(),
        };
        date.and_time(NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for LimitWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitWindow::Daily => write!(f, "daily"),
            LimitWindow::Monthly => write!(f, "monthly"),
        }
    }
}

// ---------------------------------------------------------------------------
// SpendLimits
// ---------------------------------------------------------------------------

/// Per-wallet limit configuration, in the wallet's own currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendLimits {
    /// Maximum cumulative amount per daily window.
    pub daily: Decimal,
    /// Maximum cumulative amount per monthly window.
    pub monthly: Decimal,
}

impl SpendLimits {
    /// The configured cap for a window.
    pub fn limit_for(&self, window: LimitWindow) -> Decimal {
        match window {
            LimitWindow::Daily => self.daily,
            LimitWindow::Monthly => self.monthly,
        }
    }

    /// Whether `candidate` fits on top of what the window has already seen.
    ///
    /// Landing exactly on the limit is allowed; the first amount past it
    /// is not.
    pub fn allows(&self, window: LimitWindow, period_total: Decimal, candidate: Decimal) -> bool {
        period_total + candidate <= self.limit_for(window)
    }
}

impl Default for SpendLimits {
    fn default() -> Self {
        Self {
            daily: config::default_daily_limit(),
            monthly: config::default_monthly_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn daily_window_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 14, 35, 9).unwrap();
        let start = LimitWindow::Daily.start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap());
    }

    #[test]
    fn monthly_window_starts_on_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 14, 35, 9).unwrap();
        let start = LimitWindow::Monthly.start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn monthly_window_on_the_first_is_idempotent() {
        let now = Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(LimitWindow::Monthly.start(now), now);
    }

    #[test]
    fn default_limits_come_from_config() {
        let limits = SpendLimits::default();
        assert_eq!(limits.daily, dec!(10000));
        assert_eq!(limits.monthly, dec!(50000));
    }

    #[test]
    fn landing_exactly_on_the_limit_is_allowed() {
        let limits = SpendLimits::default();
        assert!(limits.allows(LimitWindow::Daily, dec!(9950), dec!(50)));
    }

    #[test]
    fn one_cent_past_the_limit_is_rejected() {
        let limits = SpendLimits::default();
        assert!(!limits.allows(LimitWindow::Daily, dec!(9950), dec!(50.01)));
        assert!(!limits.allows(LimitWindow::Daily, dec!(9950), dec!(100)));
    }

    #[test]
    fn windows_are_checked_against_their_own_caps() {
        let limits = SpendLimits {
            daily: dec!(100),
            monthly: dec!(300),
        };
        assert_eq!(limits.limit_for(LimitWindow::Daily), dec!(100));
        assert_eq!(limits.limit_for(LimitWindow::Monthly), dec!(300));
        // Fits the month, not the day.
        assert!(!limits.allows(LimitWindow::Daily, dec!(50), dec!(60)));
        assert!(limits.allows(LimitWindow::Monthly, dec!(50), dec!(60)));
    }

    #[test]
    fn window_display_is_lowercase() {
        assert_eq!(LimitWindow::Daily.to_string(), "daily");
        assert_eq!(LimitWindow::Monthly.to_string(), "monthly");
    }
}

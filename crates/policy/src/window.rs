//! Fixed spending windows
//!
//! A window opens at the first spend after the previous one expired and
//! lasts a fixed number of seconds.

use dsp_core::Amount;
use serde::{Deserialize, Serialize};

/// Amount spent by one sender inside the current window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingWindow {
    spent: Amount,
    window_start: i64,
}

impl SpendingWindow {
    fn expired(&self, now: i64, length: i64) -> bool {
        now - self.window_start >= length
    }

    /// Spent amount as seen at `now`; zero once the window has expired
    pub fn spent_at(&self, now: i64, length: i64) -> Amount {
        if self.expired(now, length) {
            Amount::ZERO
        } else {
            self.spent
        }
    }

    /// Add a spend, opening a new window first if the old one expired
    pub fn record(&mut self, now: i64, length: i64, amount: Amount) {
        if self.expired(now, length) {
            self.window_start = now;
            self.spent = Amount::ZERO;
        }
        self.spent = self.spent.checked_add(&amount).unwrap_or(self.spent);
    }

    pub fn window_start(&self) -> i64 {
        self.window_start
    }
}

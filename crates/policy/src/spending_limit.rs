//! Rolling spending limits per sender
//!
//! One implementation serves the weekly limit and the anonymous daily and
//! weekly limits; [`SpendingScope`] supplies the name, message and window.

use dsp_core::{Address, Amount, ONE_DAY, ONE_WEEK};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::context::TransferContext;
use crate::decision::{PolicyRejection, Verdict};
use crate::traits::TransferPolicy;
use crate::window::SpendingWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendingScope {
    Weekly,
    AnonymousWeekly,
    AnonymousDaily,
}

impl SpendingScope {
    pub fn policy_name(&self) -> &'static str {
        match self {
            SpendingScope::Weekly => "WeeklySpendingLimitPolicy",
            SpendingScope::AnonymousWeekly => "AnonymousWeeklySpendingLimitPolicy",
            SpendingScope::AnonymousDaily => "AnonymousDailySpendingLimitPolicy",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            SpendingScope::Weekly => "Transfer would exceed senders weekly spending limit",
            SpendingScope::AnonymousWeekly => {
                "Transfer would exceed senders weekly anonymous spending limit"
            }
            SpendingScope::AnonymousDaily => {
                "Transfer would exceed senders daily anonymous spending limit"
            }
        }
    }

    /// Window length in seconds
    pub fn window(&self) -> i64 {
        match self {
            SpendingScope::Weekly | SpendingScope::AnonymousWeekly => ONE_WEEK,
            SpendingScope::AnonymousDaily => ONE_DAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingLimitPolicy {
    scope: SpendingScope,
    limit: Amount,
    windows: HashMap<Address, SpendingWindow>,
}

impl SpendingLimitPolicy {
    pub fn new(scope: SpendingScope, limit: Amount) -> Self {
        Self {
            scope,
            limit,
            windows: HashMap::new(),
        }
    }

    pub fn scope(&self) -> SpendingScope {
        self.scope
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }

    /// Amount `sender` has spent in the window open at `now`
    pub fn spent(&self, sender: &Address, now: i64) -> Amount {
        self.windows
            .get(sender)
            .map(|w| w.spent_at(now, self.scope.window()))
            .unwrap_or(Amount::ZERO)
    }
}

impl TransferPolicy for SpendingLimitPolicy {
    fn name(&self) -> &'static str {
        self.scope.policy_name()
    }

    fn check(&self, ctx: &TransferContext) -> Verdict {
        let within = self
            .spent(&ctx.from, ctx.now)
            .checked_add(&ctx.amount)
            .map(|total| total <= self.limit)
            .unwrap_or(false);

        if within {
            Verdict::Continue
        } else {
            Verdict::Reject(PolicyRejection::limit_exceeded(
                self.name(),
                self.scope.reason(),
            ))
        }
    }

    fn record(&mut self, ctx: &TransferContext, _verdict: &Verdict) {
        let window = self.scope.window();
        self.windows
            .entry(ctx.from)
            .or_default()
            .record(ctx.now, window, ctx.amount);
    }
}

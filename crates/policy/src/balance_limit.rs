//! Receiver balance cap
//!
//! Transfers that would lift a receiver above the cap are not refused. The
//! part above the cap is held as overflow for that receiver.

use dsp_core::{Address, Amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::context::TransferContext;
use crate::decision::Verdict;
use crate::traits::TransferPolicy;

pub const BALANCE_LIMIT_POLICY: &str = "BalanceLimitPolicy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLimitPolicy {
    cap: Amount,
    /// Cap as a share of total supply; overrides `cap` when set
    cap_fraction: Option<Decimal>,
    exempt: HashSet<Address>,
    overflow: HashMap<Address, Amount>,
}

impl BalanceLimitPolicy {
    pub fn new(cap: Amount) -> Self {
        Self {
            cap,
            cap_fraction: None,
            exempt: HashSet::new(),
            overflow: HashMap::new(),
        }
    }

    pub fn with_cap_fraction(mut self, fraction: Option<Decimal>) -> Self {
        self.cap_fraction = fraction;
        self
    }

    pub fn set_exempt(&mut self, account: Address, exempt: bool) {
        if exempt {
            self.exempt.insert(account);
        } else {
            self.exempt.remove(&account);
        }
        tracing::info!(%account, exempt, "Balance limit exemption changed");
    }

    pub fn is_exempt(&self, account: &Address) -> bool {
        self.exempt.contains(account)
    }

    /// Cap applying to `account`. Exempt accounts report zero (no cap).
    pub fn user_balance_limit_of(&self, account: &Address, total_supply: Amount) -> Amount {
        if self.is_exempt(account) {
            return Amount::ZERO;
        }
        match self.cap_fraction {
            Some(fraction) => total_supply
                .value()
                .checked_mul(fraction)
                .and_then(|cap| Amount::truncated(cap).ok())
                .unwrap_or(self.cap),
            None => self.cap,
        }
    }

    pub fn overflow_balance_of(&self, account: &Address) -> Amount {
        self.overflow.get(account).copied().unwrap_or(Amount::ZERO)
    }

    /// Overflow that fits under the cap again, given the current balance
    pub fn releasable(&self, account: &Address, balance: Amount, total_supply: Amount) -> Amount {
        let overflow = self.overflow_balance_of(account);
        if self.is_exempt(account) {
            return overflow;
        }
        let headroom = self
            .user_balance_limit_of(account, total_supply)
            .saturating_sub(&balance);
        overflow.min(headroom)
    }

    /// Remove `amount` from the account's overflow after it was paid out
    pub fn take_overflow(&mut self, account: &Address, amount: Amount) {
        if let Some(held) = self.overflow.get_mut(account) {
            *held = held.saturating_sub(&amount);
            if held.is_zero() {
                self.overflow.remove(account);
            }
        }
    }
}

impl TransferPolicy for BalanceLimitPolicy {
    fn name(&self) -> &'static str {
        BALANCE_LIMIT_POLICY
    }

    fn check(&self, ctx: &TransferContext) -> Verdict {
        // Exempt senders distribute past every later policy
        if self.is_exempt(&ctx.from) {
            return Verdict::Settle;
        }
        if self.is_exempt(&ctx.to) {
            return Verdict::Continue;
        }

        let headroom = self
            .user_balance_limit_of(&ctx.to, ctx.total_supply)
            .saturating_sub(&ctx.receiver_balance);
        if ctx.amount <= headroom {
            return Verdict::Continue;
        }

        Verdict::Overflow {
            immediate: headroom,
            held: ctx.amount.saturating_sub(&headroom),
        }
    }

    fn record(&mut self, ctx: &TransferContext, verdict: &Verdict) {
        if let Verdict::Overflow { held, .. } = verdict {
            let entry = self.overflow.entry(ctx.to).or_insert(Amount::ZERO);
            *entry = entry.checked_add(held).unwrap_or(*entry);
            tracing::debug!(receiver = %ctx.to, %held, overflow = %entry, "Overflow recorded");
        }
    }
}

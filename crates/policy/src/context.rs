//! Transfer context handed to every policy

use dsp_core::{Address, Amount};

/// Everything a policy may look at when judging a transfer.
///
/// Balances are displayed (interest-scaled) amounts at `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferContext {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Unix seconds
    pub now: i64,
    pub receiver_balance: Amount,
    pub total_supply: Amount,
}

impl TransferContext {
    pub fn new(from: Address, to: Address, amount: Amount, now: i64) -> Self {
        Self {
            from,
            to,
            amount,
            now,
            receiver_balance: Amount::ZERO,
            total_supply: Amount::ZERO,
        }
    }

    pub fn with_receiver_balance(mut self, balance: Amount) -> Self {
        self.receiver_balance = balance;
        self
    }

    pub fn with_total_supply(mut self, supply: Amount) -> Self {
        self.total_supply = supply;
        self
    }
}

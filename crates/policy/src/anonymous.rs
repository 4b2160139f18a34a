//! Per-transaction cap for anonymous transfers

use dsp_core::Amount;
use serde::{Deserialize, Serialize};

use crate::context::TransferContext;
use crate::decision::{PolicyRejection, Verdict};
use crate::traits::TransferPolicy;

pub const ANONYMOUS_TRANSACTION_AMOUNT_LIMIT_POLICY: &str = "AnonymousTransactionAmountLimitPolicy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousTransactionAmountLimitPolicy {
    limit: Amount,
}

impl AnonymousTransactionAmountLimitPolicy {
    pub fn new(limit: Amount) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }
}

impl TransferPolicy for AnonymousTransactionAmountLimitPolicy {
    fn name(&self) -> &'static str {
        ANONYMOUS_TRANSACTION_AMOUNT_LIMIT_POLICY
    }

    fn check(&self, ctx: &TransferContext) -> Verdict {
        if ctx.amount > self.limit {
            Verdict::Reject(PolicyRejection::limit_exceeded(
                self.name(),
                "Amount must be less than TRANSACTION AMOUNT LIMIT",
            ))
        } else {
            Verdict::Continue
        }
    }
}

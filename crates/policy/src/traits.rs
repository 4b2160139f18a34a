//! Policy trait - interface every transfer rule implements

use crate::context::TransferContext;
use crate::decision::Verdict;

/// A transfer rule.
///
/// `check` must not change state: the chain may still reject the transfer
/// after this policy passed it, or the ledger may fail to apply it. Only after
/// the transfer is applied does the chain call `record` with the verdict this
/// policy returned.
pub trait TransferPolicy {
    /// Policy name used in rejection messages and logs
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &TransferContext) -> Verdict;

    /// Update window counters or ledgers after an applied transfer
    fn record(&mut self, _ctx: &TransferContext, _verdict: &Verdict) {}
}

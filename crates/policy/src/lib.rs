//! DSP Policy - Transfer compliance chain
//!
//! Every transfer of the CB token passes through an ordered chain of policies:
//! - BalanceLimit: receiver cap, excess held as overflow
//! - WeeklySpendingLimit: per-sender weekly total
//! - Authenticated: bank-backed identities settle the transfer
//! - Anonymous limits: per-transaction, daily and weekly caps for the rest
//!
//! Evaluation is pure. Policy state changes only when the ledger commits.

pub mod anonymous;
pub mod authenticated;
pub mod balance_limit;
pub mod chain;
pub mod config;
pub mod context;
pub mod decision;
pub mod error;
pub mod spending_limit;
pub mod traits;
pub mod window;

pub use anonymous::AnonymousTransactionAmountLimitPolicy;
pub use authenticated::{AuthenticatedPolicy, AuthenticationStatus, Bank, PersonAuthentication};
pub use balance_limit::BalanceLimitPolicy;
pub use chain::{ChainEvaluation, Policy, PolicyChain, PolicyId, PolicyNode};
pub use config::PolicyConfig;
pub use context::TransferContext;
pub use decision::{Outcome, PolicyRejection, RejectionKind, Verdict};
pub use error::{PolicyError, PolicyResult};
pub use spending_limit::{SpendingLimitPolicy, SpendingScope};
pub use traits::TransferPolicy;
pub use window::SpendingWindow;

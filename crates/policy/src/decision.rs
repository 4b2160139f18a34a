//! Policy verdicts and chain outcomes
//!
//! Each policy answers a transfer with a [`Verdict`]; the chain folds the
//! verdicts of the policies it visits into one [`Outcome`].

use dsp_core::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a rejected transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    NotAuthenticated,
    LimitExceeded,
}

/// A transfer refused by a named policy.
///
/// Displays as `"<PolicyName>: <reason>"`.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{policy}: {reason}")]
pub struct PolicyRejection {
    pub policy: String,
    pub kind: RejectionKind,
    pub reason: String,
}

impl PolicyRejection {
    pub fn new(policy: impl Into<String>, kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn limit_exceeded(policy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(policy, RejectionKind::LimitExceeded, reason)
    }

    pub fn not_authenticated(policy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(policy, RejectionKind::NotAuthenticated, reason)
    }
}

/// What one policy says about a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No objection, ask the next policy
    Continue,
    /// Accept now, skip the rest of the chain
    Settle,
    /// Not satisfied here; the next policy decides, or reject at the tail
    Fallthrough(PolicyRejection),
    /// Accept, but only `immediate` reaches the receiver
    Overflow { immediate: Amount, held: Amount },
    /// Refuse the transfer
    Reject(PolicyRejection),
}

impl Verdict {
    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject(_))
    }
}

/// Result of running the whole chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accept(Amount),
    AcceptWithOverflow { immediate: Amount, held: Amount },
    Reject(PolicyRejection),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Outcome::Reject(_))
    }

    /// Amounts credited to the receiver and held back, if accepted
    pub fn split(&self) -> Option<(Amount, Amount)> {
        match self {
            Outcome::Accept(amount) => Some((*amount, Amount::ZERO)),
            Outcome::AcceptWithOverflow { immediate, held } => Some((*immediate, *held)),
            Outcome::Reject(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&PolicyRejection> {
        match self {
            Outcome::Reject(rejection) => Some(rejection),
            _ => None,
        }
    }
}

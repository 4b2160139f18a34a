//! Ledger errors

use dsp_core::{AccessError, Address, AmountError, Role};
use dsp_interest::InterestError;
use dsp_policy::{PolicyError, PolicyRejection, RejectionKind};
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{actor} is missing role {role}")]
    Unauthorized { actor: Address, role: Role },

    #[error("Access error: {0}")]
    Access(AccessError),

    /// Refused by a policy for lack of authentication
    #[error("{0}")]
    NotAuthenticated(PolicyRejection),

    /// Refused by a policy limit
    #[error("{0}")]
    LimitExceeded(PolicyRejection),

    #[error("Insufficient balance for {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: String,
        required: String,
    },

    #[error("Insufficient allowance for {spender} on {owner}: available {available}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: String,
        required: String,
    },

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{caller} cannot act for {account}")]
    NotAccountHolder { caller: Address, account: Address },

    #[error("Only the issuer may transfer to the zero address, not {0}")]
    ForbiddenBurnTransfer(Address),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Interest error: {0}")]
    Interest(InterestError),

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

impl From<AccessError> for LedgerError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized { actor, role } => LedgerError::Unauthorized { actor, role },
            other => LedgerError::Access(other),
        }
    }
}

impl From<InterestError> for LedgerError {
    fn from(err: InterestError) -> Self {
        match err {
            InterestError::InvalidRate { .. } => LedgerError::InvalidRate(err.to_string()),
            other => LedgerError::Interest(other),
        }
    }
}

impl From<PolicyRejection> for LedgerError {
    fn from(rejection: PolicyRejection) -> Self {
        match rejection.kind {
            RejectionKind::NotAuthenticated => LedgerError::NotAuthenticated(rejection),
            RejectionKind::LimitExceeded => LedgerError::LimitExceeded(rejection),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

//! Policy administration errors

use dsp_core::Address;
use thiserror::Error;

use crate::PolicyId;

/// Errors from configuring policies. Transfer rejections are not errors at
/// this layer; they are [`crate::PolicyRejection`] values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown policy: {0}")]
    UnknownPolicy(PolicyId),

    #[error("Linking {from} -> {to} would create a cycle")]
    CycleDetected { from: PolicyId, to: PolicyId },

    #[error("No {0} registered")]
    PolicyNotRegistered(&'static str),

    #[error("{0} is not a recognized bank")]
    NotBank(Address),

    #[error("Unknown bank: {0}")]
    UnknownBank(Address),

    #[error("{person} was authenticated by another bank ({issuer})")]
    NotIssuingBank { person: Address, issuer: Address },

    #[error("{0} is not an authenticated person")]
    PersonNotAuthenticated(Address),

    #[error("{0} is not an authenticated contract")]
    ContractNotAuthenticated(Address),

    #[error("{caller} may not revoke authentication of {target}")]
    NotAuthorizedToRevoke { caller: Address, target: Address },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for policy administration
pub type PolicyResult<T> = Result<T, PolicyError>;

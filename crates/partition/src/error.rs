//! Partitioned token and swap errors

use dsp_core::{AccessError, Address, Partition, Role};
use dsp_ledger::LedgerError;
use thiserror::Error;

/// Errors raised by [`crate::PartitionedLedger`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionedError {
    #[error("{actor} is missing role {role}")]
    Unauthorized { actor: Address, role: Role },

    #[error("Access error: {0}")]
    Access(AccessError),

    #[error("{0} is neither a controller nor a minter")]
    NotIssuer(Address),

    #[error("{operator} is not an operator for {holder} in partition {partition}")]
    NotOperator {
        operator: Address,
        holder: Address,
        partition: Partition,
    },

    #[error("Insufficient balance for {holder} in partition {partition}: available {available}, required {required}")]
    InsufficientBalance {
        holder: Address,
        partition: Partition,
        available: String,
        required: String,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Token has no default partition")]
    NoDefaultPartition,

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

impl From<AccessError> for PartitionedError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized { actor, role } => {
                PartitionedError::Unauthorized { actor, role }
            }
            other => PartitionedError::Access(other),
        }
    }
}

pub type PartitionedResult<T> = Result<T, PartitionedError>;

/// Errors raised by [`crate::TokenSwap`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("{actor} is missing role {role}")]
    Unauthorized { actor: Address, role: Role },

    #[error("Access error: {0}")]
    Access(AccessError),

    #[error("CB leg failed: {0}")]
    Cb(#[from] LedgerError),

    #[error("CBS leg failed: {0}")]
    Cbs(#[from] PartitionedError),

    /// The escrow hit a balance cap, so part of the CB never arrived
    #[error("Swap escrow could not receive the full amount, {held} held as overflow")]
    EscrowCapped { held: String },
}

impl From<AccessError> for SwapError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized { actor, role } => SwapError::Unauthorized { actor, role },
            other => SwapError::Access(other),
        }
    }
}

pub type SwapResult<T> = Result<T, SwapError>;

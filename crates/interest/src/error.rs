//! Interest index errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterestError {
    #[error("Invalid interest rate: {ray} (ray) exceeds maximum {max}")]
    InvalidRate { ray: u128, max: String },

    #[error("Time moved backwards: last update {last_update}, now {now}")]
    NonMonotonicTime { last_update: i64, now: i64 },

    #[error("Year {0} has not been closed")]
    YearNotClosed(i32),

    #[error("Accounting year {0} is already closed")]
    YearAlreadyClosed(i32),

    #[error("Year {0} is outside the supported calendar")]
    YearOutOfRange(i32),

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

pub type InterestResult<T> = Result<T, InterestError>;

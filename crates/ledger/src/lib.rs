//! DSP Ledger - Interest-bearing CB token
//!
//! # Key Types
//! - `Ledger`: principal balances, supply, allowances, roles and the policy chain
//! - `Account`: principal plus per-year activity for interest reporting
//! - `TransferReceipt`: how much of a transfer was credited or held
//! - `TokenConfig`: name, symbol, precision, rate ceiling and policy limits

pub mod account;
pub mod admin;
pub mod config;
pub mod error;
pub mod token;

pub use account::{Account, YearRecord};
pub use config::TokenConfig;
pub use error::{LedgerError, LedgerResult};
pub use token::{Ledger, TransferReceipt, OVERFLOW_RESERVE_LABEL};

//! DSP Core - Shared types for the DSP token
//!
//! Amounts, addresses, partition keys, roles and the explicit time context
//! every other crate builds on.

pub mod access;
pub mod address;
pub mod amount;
pub mod clock;
pub mod partition;

pub use access::{AccessControl, AccessError, Role, RoleGate};
pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError, DECIMALS};
pub use clock::{year_start, AccrualContext, ONE_DAY, ONE_WEEK, ONE_YEAR, SECONDS_PER_YEAR};
pub use partition::{Partition, PartitionError};

//! DSP Interest - Global interest index
//!
//! Holds the annual rate, the cumulative index and the per-year closing
//! snapshots. All conversion between principal and displayed balances goes
//! through [`InterestIndex`].

pub mod error;
pub mod index;

pub use error::{InterestError, InterestResult};
pub use index::{
    fraction_to_ray, ray_to_fraction, InterestIndex, DEFAULT_MAX_ANNUAL_RATE, INDEX_DP, RAY,
};

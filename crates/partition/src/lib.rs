//! DSP Partition - CBS token and the CB/CBS swap bridge

pub mod error;
pub mod swap;
pub mod token;

pub use error::{PartitionedError, PartitionedResult, SwapError, SwapResult};
pub use swap::{TokenSwap, SWAP_ESCROW_LABEL};
pub use token::PartitionedLedger;

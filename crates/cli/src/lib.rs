//! DSP CLI - command orchestration over the stored tokens

pub mod commands;
pub mod context;

pub use context::{parse_address, AppContext};

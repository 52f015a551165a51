pub mod cli;
pub mod policy;
pub mod serve;

use core::error::Error;

/// Errors raised while loading the validator policy.
#[derive(Debug, derive_more::Display)]
pub enum ConfigError {
    #[display("Failed to read policy file {path}")]
    Read { path: String },
    #[display("Failed to parse policy document")]
    Parse,
}

impl Error for ConfigError {}

pub use cli::*;
pub use policy::*;
pub use serve::*;

pub mod env;
pub mod gpu;
pub mod logging;
pub mod quantity;
pub mod version;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid `{annotation}` annotation `{value}`: {source}")]
    InvalidCustomGpuResourceTypes {
        annotation: &'static str,
        value: String,
        source: serde_json::Error,
    },

    #[error("invalid quantity `{0}`")]
    InvalidQuantity(String),
}

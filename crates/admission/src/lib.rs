//! Admission validation for KServe InferenceServices.
//!
//! [`validation::InferenceServiceValidator`] decides whether a proposed
//! InferenceService is internally consistent before it is persisted. The
//! [`webhook`] module exposes it as a Kubernetes validating admission webhook.

pub mod config;
pub mod constants;
pub mod error;
pub mod resolver;
pub mod validation;
pub mod webhook;

pub use error::ValidationError;
pub use resolver::CapabilityResolver;
pub use resolver::ClusterCapabilities;
pub use validation::InferenceServiceValidator;
pub use validation::Operation;
pub use validation::Warnings;

//! Shared API type definitions
//!
//! This crate contains the `serving.kserve.io/v1beta1` InferenceService resource
//! model used by the admission engine and its transport: the top-level custom
//! resource, the predictor/transformer/explainer component specs, and the
//! autoscaling metric specs.
//!
//! The types are plain data. The only behavior here is the [`Component`]
//! capability trait, which lets callers treat every component role uniformly
//! and count the serving implementations populated on it.

mod autoscaling;
mod component;
mod inference_service;

pub use autoscaling::*;
pub use component::*;
pub use inference_service::*;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Name of the enum being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] is not a valid {}", self.value, self.kind)
    }
}

impl std::error::Error for UnknownVariant {}

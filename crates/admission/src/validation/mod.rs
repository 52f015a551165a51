//! Admission checks for InferenceService create and update requests.
//!
//! [`InferenceServiceValidator::validate`] runs the evaluators in a fixed
//! order and stops at the first rejection:
//! name, autoscaler class, target utilization, multi-node, collocation, then
//! every component (predictor, transformer, explainer).

mod autoscaler;
mod component;
mod multi_node;
mod name;
mod scaling;

use std::sync::Arc;

use api_types::InferenceService;
use error_stack::Report;

pub use self::autoscaler::validate_autoscaler_class;
pub use self::autoscaler::validate_target_utilization;
pub use self::component::validate_collocation_storage_uri;
pub use self::component::validate_component;
pub use self::multi_node::validate_multi_node;
pub use self::name::validate_name;
pub use self::scaling::ScalingBackend;
pub use self::scaling::select_scaling_backend;
use crate::config::ValidatorConfig;
use crate::error::ValidationError;
use crate::resolver::CapabilityResolver;
use crate::resolver::ClusterCapabilities;

/// Admission operation being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Non-fatal notes returned alongside an accepted object.
pub type Warnings = Vec<String>;

/// Entry point of the validation engine.
///
/// Stateless apart from its read-only policy, so a single instance is shared
/// across request handlers.
#[derive(Debug, Clone)]
pub struct InferenceServiceValidator<R = ClusterCapabilities> {
    config: Arc<ValidatorConfig>,
    resolver: R,
}

impl InferenceServiceValidator<ClusterCapabilities> {
    /// Builds a validator whose GPU lookups use the configured resource types.
    pub fn from_config(config: ValidatorConfig) -> Self {
        let resolver = ClusterCapabilities::new(config.gpu_resource_types.clone());
        Self::new(Arc::new(config), resolver)
    }
}

impl<R: CapabilityResolver> InferenceServiceValidator<R> {
    pub fn new(config: Arc<ValidatorConfig>, resolver: R) -> Self {
        Self { config, resolver }
    }

    /// Decides whether `new` may be admitted.
    ///
    /// Create and update run the same checks; `old` is not consulted. Delete is
    /// always accepted.
    ///
    /// # Errors
    ///
    /// The first [`ValidationError`] raised by any check.
    pub fn validate(
        &self,
        operation: Operation,
        _old: Option<&InferenceService>,
        new: &InferenceService,
    ) -> Result<Warnings, Report<ValidationError>> {
        tracing::info!(%operation, name = new.name(), "validating inference service");

        if operation == Operation::Delete {
            return Ok(Warnings::new());
        }

        self.validate_object(new).inspect_err(|report| {
            tracing::debug!(
                %operation,
                name = new.name(),
                reason = %report.current_context(),
                "rejected inference service"
            );
        })
    }

    fn validate_object(&self, isvc: &InferenceService) -> Result<Warnings, Report<ValidationError>> {
        validate_name(isvc)?;
        validate_autoscaler_class(isvc, &self.config)?;
        validate_target_utilization(isvc)?;
        validate_multi_node(isvc, &self.resolver)?;
        validate_collocation_storage_uri(isvc, &self.resolver)?;

        let backend = select_scaling_backend(isvc.annotations());
        for component in isvc.spec.components() {
            validate_component(component, backend, &self.config, &self.resolver)?;
        }

        Ok(Warnings::new())
    }
}

//! Cluster-dependent lookups the validation engine delegates to.

use std::collections::BTreeMap;

use error_stack::Report;
use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::core::v1::ResourceRequirements;
use utils::ResolveError;

/// Answers questions the validator cannot decide from the manifest alone.
pub trait CapabilityResolver: Send + Sync {
    /// Whether `resources` name a resource that is neither basic nor a known
    /// GPU type, taking the custom GPU type annotation into account.
    fn is_unknown_gpu_resource_type(
        &self,
        resources: Option<&ResourceRequirements>,
        annotations: &BTreeMap<String, String>,
    ) -> Result<bool, Report<ResolveError>>;

    /// Look up `key` in a container environment.
    fn lookup_env_var<'a>(&self, env: &'a [EnvVar], key: &str) -> Option<&'a str>;
}

/// Default resolver backed by the configured GPU resource types.
#[derive(Debug, Clone)]
pub struct ClusterCapabilities {
    gpu_resource_types: Vec<String>,
}

impl ClusterCapabilities {
    pub fn new(gpu_resource_types: Vec<String>) -> Self {
        Self { gpu_resource_types }
    }
}

impl Default for ClusterCapabilities {
    fn default() -> Self {
        Self::new(
            utils::gpu::DEFAULT_GPU_RESOURCE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl CapabilityResolver for ClusterCapabilities {
    fn is_unknown_gpu_resource_type(
        &self,
        resources: Option<&ResourceRequirements>,
        annotations: &BTreeMap<String, String>,
    ) -> Result<bool, Report<ResolveError>> {
        utils::gpu::is_unknown_gpu_resource_type(resources, annotations, &self.gpu_resource_types)
            .map_err(Report::new)
    }

    fn lookup_env_var<'a>(&self, env: &'a [EnvVar], key: &str) -> Option<&'a str> {
        utils::env::lookup_env_var(env, key)
    }
}

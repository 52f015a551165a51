//! GPU resource type classification

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::ResourceRequirements;

use crate::ResolveError;

/// Annotation carrying a JSON array of extra GPU resource names.
pub const CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION: &str = "serving.kserve.io/gpu-resource-types";

/// GPU resource names recognized without any configuration.
pub const DEFAULT_GPU_RESOURCE_TYPES: &[&str] = &[
    "nvidia.com/gpu",
    "amd.com/gpu",
    "intel.com/gpu",
    "habana.ai/gaudi",
];

/// Resource names that are never GPUs.
const BASIC_RESOURCE_TYPES: &[&str] = &["cpu", "memory", "storage", "ephemeral-storage"];

fn is_basic_resource(name: &str) -> bool {
    BASIC_RESOURCE_TYPES.contains(&name) || name.starts_with("hugepages-")
}

/// Reports whether `resources` request or limit anything that is neither a
/// basic resource nor a known GPU type.
///
/// Known GPU types are `known_gpu_resource_types` plus the names listed in the
/// [`CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION`] annotation, if present.
///
/// # Errors
///
/// - [`ResolveError::InvalidCustomGpuResourceTypes`] if the annotation is not a
///   JSON array of strings
pub fn is_unknown_gpu_resource_type(
    resources: Option<&ResourceRequirements>,
    annotations: &BTreeMap<String, String>,
    known_gpu_resource_types: &[String],
) -> Result<bool, ResolveError> {
    let Some(resources) = resources else {
        return Ok(false);
    };

    let mut possible_gpu_types: BTreeSet<&str> = resources
        .limits
        .iter()
        .chain(resources.requests.iter())
        .flat_map(|list| list.keys())
        .map(String::as_str)
        .filter(|name| !is_basic_resource(name))
        .collect();

    if possible_gpu_types.is_empty() {
        return Ok(false);
    }

    for known in known_gpu_resource_types {
        possible_gpu_types.remove(known.as_str());
    }

    if let Some(value) = annotations.get(CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION) {
        let custom: Vec<String> = serde_json::from_str(value).map_err(|source| {
            ResolveError::InvalidCustomGpuResourceTypes {
                annotation: CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION,
                value: value.clone(),
                source,
            }
        })?;
        for name in &custom {
            possible_gpu_types.remove(name.as_str());
        }
    }

    Ok(!possible_gpu_types.is_empty())
}

use std::collections::BTreeMap;

use api_types::AutoscalerClass;
use api_types::InferenceService;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::ResourceRequirements;

use crate::constants::AUTOSCALER_CLASS_ANNOTATION;
use crate::constants::CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION;
use crate::constants::PIPELINE_PARALLEL_SIZE_ENV;
use crate::constants::PVC_STORAGE_PROTOCOL;
use crate::constants::TENSOR_PARALLEL_SIZE_ENV;
use crate::error::ValidationError;
use crate::resolver::CapabilityResolver;

/// Checks a predictor that declares a `workerSpec`.
///
/// The environment, GPU, storage and autoscaler checks on the head node apply
/// when the predictor uses a built-in server, either a framework or `model`.
pub fn validate_multi_node(
    isvc: &InferenceService,
    resolver: &impl CapabilityResolver,
) -> Result<(), Report<ValidationError>> {
    let predictor = &isvc.spec.predictor;
    let Some(worker) = &predictor.worker_spec else {
        return Ok(());
    };
    let name = isvc.name();

    if worker.containers.len() > 1 {
        return Err(Report::new(ValidationError::MultipleWorkerContainers {
            name: name.to_string(),
        }));
    }

    if let Some(head) = predictor.built_in_extension() {
        for env in [PIPELINE_PARALLEL_SIZE_ENV, TENSOR_PARALLEL_SIZE_ENV] {
            if resolver.lookup_env_var(&head.env, env).is_some() {
                return Err(Report::new(ValidationError::ParallelSizeEnvOverride {
                    name: name.to_string(),
                    env,
                }));
            }
        }

        ensure_known_gpu_type(
            name,
            head.resources.as_ref(),
            isvc.annotations(),
            resolver,
        )?;

        let Some(storage_uri) = &head.storage_uri else {
            return Err(Report::new(ValidationError::MissingStorageUri {
                name: name.to_string(),
            }));
        };
        let protocol = storage_uri
            .split_once("://")
            .map_or(storage_uri.as_str(), |(protocol, _)| protocol);
        if protocol != PVC_STORAGE_PROTOCOL {
            return Err(Report::new(ValidationError::UnsupportedStorageProtocol {
                name: name.to_string(),
                protocol: protocol.to_string(),
            }));
        }

        let class = isvc
            .annotation(AUTOSCALER_CLASS_ANNOTATION)
            .unwrap_or_default();
        if class != AutoscalerClass::External.as_str() {
            return Err(Report::new(ValidationError::MultiNodeAutoscalerNotExternal {
                name: name.to_string(),
                class: class.to_string(),
            }));
        }
    }

    if let Some(size) = worker.pipeline_parallel_size.filter(|size| *size < 2) {
        return Err(Report::new(ValidationError::PipelineParallelSizeTooSmall {
            name: name.to_string(),
            size,
        }));
    }
    if let Some(size) = worker.tensor_parallel_size.filter(|size| *size < 1) {
        return Err(Report::new(ValidationError::TensorParallelSizeTooSmall {
            name: name.to_string(),
            size,
        }));
    }

    for container in &worker.containers {
        ensure_known_gpu_type(
            name,
            container.resources.as_ref(),
            isvc.annotations(),
            resolver,
        )?;
    }

    Ok(())
}

fn ensure_known_gpu_type(
    name: &str,
    resources: Option<&ResourceRequirements>,
    annotations: &BTreeMap<String, String>,
    resolver: &impl CapabilityResolver,
) -> Result<(), Report<ValidationError>> {
    let unknown = resolver
        .is_unknown_gpu_resource_type(resources, annotations)
        .change_context_lazy(|| ValidationError::GpuResourceLookup {
            name: name.to_string(),
        })?;

    if unknown {
        return Err(Report::new(ValidationError::UnknownGpuResourceType {
            name: name.to_string(),
            annotation: CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION,
        }));
    }
    Ok(())
}

//! Annotation keys, environment variable names and other well-known strings.

pub use api_types::INFERENCE_SERVICE_CONTAINER_NAME;
pub use api_types::TRANSFORMER_CONTAINER_NAME;
pub use utils::gpu::CUSTOM_GPU_RESOURCE_TYPES_ANNOTATION;

/// Grammar an InferenceService name must match.
pub const ISVC_NAME_FMT: &str = "[a-z]([-a-z0-9]*[a-z0-9])?";

pub const AUTOSCALER_CLASS_ANNOTATION: &str = "serving.kserve.io/autoscalerClass";
pub const AUTOSCALER_METRICS_ANNOTATION: &str = "serving.kserve.io/metrics";
pub const TARGET_UTILIZATION_PERCENTAGE_ANNOTATION: &str =
    "serving.kserve.io/targetUtilizationPercentage";
pub const DEPLOYMENT_MODE_ANNOTATION: &str = "serving.kserve.io/deploymentMode";

/// Knative autoscaler class annotation and its HPA value.
pub const KNATIVE_AUTOSCALER_CLASS_ANNOTATION: &str = "autoscaling.knative.dev/class";
pub const KNATIVE_HPA_CLASS: &str = "hpa.autoscaling.knative.dev";

pub const PIPELINE_PARALLEL_SIZE_ENV: &str = "PIPELINE_PARALLEL_SIZE";
pub const TENSOR_PARALLEL_SIZE_ENV: &str = "TENSOR_PARALLEL_SIZE";
pub const STORAGE_URI_ENV: &str = "STORAGE_URI";

/// The only storage protocol multi-node serving can mount.
pub const PVC_STORAGE_PROTOCOL: &str = "pvc";

/// Storage URI prefixes the storage initializer understands.
pub const SUPPORTED_STORAGE_URI_PREFIXES: &[&str] = &[
    "gs://",
    "s3://",
    "pvc://",
    "file://",
    "https://",
    "http://",
    "hdfs://",
    "webhdfs://",
    "oci://",
    "hf://",
];

/// Path the validating webhook is registered under.
pub const VALIDATE_PATH: &str = "/validate-inferenceservices";

/// Deployment mode selected by the `serving.kserve.io/deploymentMode` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Serverless,
    RawDeployment,
    ModelMesh,
}

impl DeploymentMode {
    /// Reads the mode annotation value; absent or unrecognized means serverless.
    pub fn from_annotation(value: Option<&str>) -> Self {
        match value {
            Some("RawDeployment") => Self::RawDeployment,
            Some("ModelMesh") => Self::ModelMesh,
            _ => Self::Serverless,
        }
    }
}

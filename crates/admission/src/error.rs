//! Rejection reasons produced by the validation engine.

use core::error::Error;

use derive_more::Display;

use crate::constants::ISVC_NAME_FMT;

/// Backend suffix of [`ValidationError::UnsupportedMetric`] for KEDA metrics.
pub const IN_KEDA: &str = " in KEDA";

/// Why an InferenceService was rejected.
///
/// The `Display` text is the message returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ValidationError {
    #[display(
        "The InferenceService \"{name}\" is invalid: a InferenceService name must consist of lower case alphanumeric characters or '-', and must start with alphabetical character. (e.g. \"my-name\" or \"abc-123\", regex used for validation is '{ISVC_NAME_FMT}')"
    )]
    InvalidName { name: String },

    #[display("[{class}] is not a supported autoscaler class type")]
    UnsupportedAutoscalerClass { class: String },

    #[display("[{metric}] is not a supported metric{backend}")]
    UnsupportedMetric {
        metric: String,
        /// Empty, or [`IN_KEDA`]
        backend: &'static str,
    },

    #[display("[{backend}] is not a supported metric backend in KEDA")]
    UnsupportedMetricBackend { backend: String },

    #[display(
        "There is a conflict between ScaleMetric and AutoScaling. Please use AutoScaling if you want to use KEDA"
    )]
    ScaleMetricConflict,

    #[display(
        "unknown auto scaling type class [{class}] with value [{source_type}]. Valid types are Resource and External"
    )]
    UnknownMetricSourceType { class: String, source_type: String },

    #[display("the target utilization percentage should be a [1-100] integer")]
    TargetUtilizationOutOfRange,

    #[display("the target memory should be greater than 1 MiB")]
    MemoryTargetTooSmall,

    #[display("the target for rps should be greater than 1")]
    RpsTargetTooSmall,

    #[display("the query should not be empty")]
    EmptyExternalQuery,

    #[display("the threshold value should not be empty")]
    MissingExternalThreshold,

    #[display("[{value}] is not a valid quantity")]
    InvalidQuantity { value: String },

    #[display("customizing deploymentStrategy is only supported for raw deployment mode")]
    DeploymentStrategyNotSupported,

    #[display(
        "the InferenceService \"{name}\" is invalid: setting multiple containers in workerSpec is not allowed"
    )]
    MultipleWorkerContainers { name: String },

    #[display(
        "the InferenceService \"{name}\" is invalid: setting {env} in environment variables is not allowed"
    )]
    ParallelSizeEnvOverride { name: String, env: &'static str },

    #[display(
        "the InferenceService \"{name}\" is invalid: Unknown GPU resource type. Set '{annotation}' annotation to use custom gpu resource type"
    )]
    UnknownGpuResourceType {
        name: String,
        annotation: &'static str,
    },

    #[display("the InferenceService \"{name}\" is invalid: failed to resolve GPU resource types")]
    GpuResourceLookup { name: String },

    #[display(
        "the InferenceService \"{name}\" is invalid: StorageURI must be set for multinode enabled"
    )]
    MissingStorageUri { name: String },

    #[display(
        "the InferenceService \"{name}\" is invalid: Multi-node InferenceService supports only the 'pvc' storage protocol, but found \"{protocol}\""
    )]
    UnsupportedStorageProtocol { name: String, protocol: String },

    #[display(
        "the InferenceService \"{name}\" is invalid: Multi-node InferenceService supports only the 'external' autoscaler, but found \"{class}\""
    )]
    MultiNodeAutoscalerNotExternal { name: String, class: String },

    #[display(
        "the InferenceService \"{name}\" is invalid: WorkerSpec.PipelineParallelSize cannot be less than 2({size})"
    )]
    PipelineParallelSizeTooSmall { name: String, size: i32 },

    #[display(
        "the InferenceService \"{name}\" is invalid: WorkerSpec.TensorParallelSize cannot be less than 1({size})"
    )]
    TensorParallelSizeTooSmall { name: String, size: i32 },

    #[display("exactly one of [{}] must be specified in {component}, found {found}", allowed.join(", "))]
    ExactlyOneImplementation {
        component: String,
        allowed: Vec<&'static str>,
        found: usize,
    },

    #[display("storage uri should not be specified in transformer container")]
    CollocatedStorageUri,

    #[display(
        "storageUri, must be one of: [{}] or be an absolute or relative local path. StorageUri [{uri}] is not supported.",
        supported.join(", ")
    )]
    UnsupportedStorageUri {
        uri: String,
        supported: Vec<&'static str>,
    },

    #[display("modelFormat.name must be specified for the model in {component}")]
    MissingModelFormat { component: String },

    #[display("MinReplicas cannot be less than 0.")]
    MinReplicasNegative,

    #[display("MaxReplicas cannot be less than 0.")]
    MaxReplicasNegative,

    #[display("'MinReplicas' cannot be greater than MaxReplicas.")]
    MinReplicasAboveMax,

    #[display("parallelism cannot be less than 0.")]
    ContainerConcurrencyNegative,

    #[display("timeout cannot be less than 0.")]
    TimeoutNegative,
}

impl Error for ValidationError {}

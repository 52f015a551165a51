use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::DeploymentStrategy;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::core::v1::ResourceRequirements;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::AutoScalingSpec;
use crate::ScaleMetric;

/// Name of the serving container of a custom predictor.
pub const INFERENCE_SERVICE_CONTAINER_NAME: &str = "kserve-container";

/// Name of the transformer container when it is collocated with the predictor.
pub const TRANSFORMER_CONTAINER_NAME: &str = "transformer-container";

/// Settings shared by every component role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentExtensionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,
    #[serde(default)]
    pub max_replicas: i32,
    /// Target value for the scale metric; a percentage for cpu, MiB for memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_target: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_metric: Option<ScaleMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_concurrency: Option<i64>,
    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canary_traffic_percent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling: Option<AutoScalingSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_strategy: Option<DeploymentStrategy>,
}

/// Serving protocol spoken by a built-in server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ProtocolVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "grpc-v1")]
    GrpcV1,
    #[serde(rename = "grpc-v2")]
    GrpcV2,
}

/// Settings of a built-in model server, including its serving container overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictorExtensionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<ProtocolVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelFormat {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Generic model spec, served by whichever runtime supports its format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub model_format: ModelFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(flatten)]
    pub extension: PredictorExtensionSpec,
}

/// Head/worker topology for serving one model across several pods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_parallel_size: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tensor_parallel_size: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
}

/// Built-in model-framework servers a predictor can name directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framework {
    SkLearn,
    XGBoost,
    Tensorflow,
    PyTorch,
    Triton,
    Onnx,
    HuggingFace,
    Pmml,
    LightGbm,
    Paddle,
}

impl Framework {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SkLearn => "sklearn",
            Self::XGBoost => "xgboost",
            Self::Tensorflow => "tensorflow",
            Self::PyTorch => "pytorch",
            Self::Triton => "triton",
            Self::Onnx => "onnx",
            Self::HuggingFace => "huggingface",
            Self::Pmml => "pmml",
            Self::LightGbm => "lightgbm",
            Self::Paddle => "paddle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ArtExplainerType {
    SquareAttack,
}

/// Adversarial Robustness Toolbox explainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtExplainerSpec {
    #[serde(rename = "type")]
    pub type_: ArtExplainerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sklearn: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xgboost: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tensorflow: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pytorch: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triton: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onnx: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmml: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightgbm: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paddle: Option<PredictorExtensionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_spec: Option<WorkerSpec>,
    /// Pod containers: a custom predictor and/or a collocated transformer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extension: ComponentExtensionSpec,
}

impl PredictorSpec {
    fn frameworks(&self) -> [(Framework, Option<&PredictorExtensionSpec>); 10] {
        [
            (Framework::SkLearn, self.sklearn.as_ref()),
            (Framework::XGBoost, self.xgboost.as_ref()),
            (Framework::Tensorflow, self.tensorflow.as_ref()),
            (Framework::PyTorch, self.pytorch.as_ref()),
            (Framework::Triton, self.triton.as_ref()),
            (Framework::Onnx, self.onnx.as_ref()),
            (Framework::HuggingFace, self.huggingface.as_ref()),
            (Framework::Pmml, self.pmml.as_ref()),
            (Framework::LightGbm, self.lightgbm.as_ref()),
            (Framework::Paddle, self.paddle.as_ref()),
        ]
    }

    /// Settings of the built-in server, framework or generic model, if one is populated.
    pub fn built_in_extension(&self) -> Option<&PredictorExtensionSpec> {
        self.frameworks()
            .into_iter()
            .find_map(|(_, spec)| spec)
            .or_else(|| self.model.as_ref().map(|model| &model.extension))
    }

    /// Looks up a container of the pod by name.
    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransformerSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extension: ComponentExtensionSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExplainerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<ArtExplainerSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extension: ComponentExtensionSpec,
}

/// Role a component plays in the serving pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Predictor,
    Transformer,
    Explainer,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A concrete serving backend populated on a component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Implementation<'a> {
    /// Built-in framework server
    Framework {
        framework: Framework,
        spec: &'a PredictorExtensionSpec,
    },
    /// Generic model spec resolved to a runtime by format
    Model(&'a ModelSpec),
    /// User-supplied serving container
    Custom(&'a Container),
    /// ART adversarial explainer
    Art(&'a ArtExplainerSpec),
}

impl Implementation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Framework { framework, .. } => framework.as_str(),
            Self::Model(_) => "model",
            Self::Custom(_) => "custom",
            Self::Art(_) => "art",
        }
    }
}

/// Capabilities every component role exposes to validation.
pub trait Component {
    fn kind(&self) -> ComponentKind;

    /// All implementations populated on this component, in declaration order.
    ///
    /// A well-formed component yields exactly one.
    fn implementations(&self) -> Vec<Implementation<'_>>;

    /// Names of the implementation variants this role accepts.
    fn implementation_names(&self) -> &'static [&'static str];

    fn extensions(&self) -> &ComponentExtensionSpec;
}

impl Component for PredictorSpec {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Predictor
    }

    fn implementations(&self) -> Vec<Implementation<'_>> {
        let mut implementations: Vec<Implementation<'_>> = self
            .frameworks()
            .into_iter()
            .filter_map(|(framework, spec)| {
                spec.map(|spec| Implementation::Framework { framework, spec })
            })
            .collect();

        if let Some(model) = &self.model {
            implementations.push(Implementation::Model(model));
        }

        // A collocated transformer container does not make this a custom predictor.
        if let Some(container) = self.container(INFERENCE_SERVICE_CONTAINER_NAME) {
            implementations.push(Implementation::Custom(container));
        }

        implementations
    }

    fn implementation_names(&self) -> &'static [&'static str] {
        &[
            "sklearn",
            "xgboost",
            "tensorflow",
            "pytorch",
            "triton",
            "onnx",
            "huggingface",
            "pmml",
            "lightgbm",
            "paddle",
            "model",
            "containers",
        ]
    }

    fn extensions(&self) -> &ComponentExtensionSpec {
        &self.extension
    }
}

impl Component for TransformerSpec {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Transformer
    }

    fn implementations(&self) -> Vec<Implementation<'_>> {
        self.containers
            .first()
            .map(Implementation::Custom)
            .into_iter()
            .collect()
    }

    fn implementation_names(&self) -> &'static [&'static str] {
        &["containers"]
    }

    fn extensions(&self) -> &ComponentExtensionSpec {
        &self.extension
    }
}

impl Component for ExplainerSpec {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Explainer
    }

    fn implementations(&self) -> Vec<Implementation<'_>> {
        let mut implementations = Vec::new();
        if let Some(art) = &self.art {
            implementations.push(Implementation::Art(art));
        }
        if let Some(container) = self.containers.first() {
            implementations.push(Implementation::Custom(container));
        }
        implementations
    }

    fn implementation_names(&self) -> &'static [&'static str] {
        &["art", "containers"]
    }

    fn extensions(&self) -> &ComponentExtensionSpec {
        &self.extension
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn container(name: &str) -> Container {
        Container {
            name: name.to_string(),
            image: Some("example.com/server:latest".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn predictor_without_implementation_yields_none() {
        let predictor = PredictorSpec::default();
        assert!(predictor.implementations().is_empty());
    }

    #[test]
    fn predictor_counts_every_populated_framework() {
        let predictor = PredictorSpec {
            sklearn: Some(PredictorExtensionSpec::default()),
            xgboost: Some(PredictorExtensionSpec::default()),
            ..Default::default()
        };

        let names: Vec<_> = predictor
            .implementations()
            .iter()
            .map(Implementation::name)
            .collect();
        assert_eq!(names, vec!["sklearn", "xgboost"]);
    }

    #[test]
    fn built_in_extension_covers_frameworks_and_model() {
        let framework = PredictorSpec {
            huggingface: Some(PredictorExtensionSpec {
                storage_uri: Some("pvc://models/llama".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            framework
                .built_in_extension()
                .and_then(|spec| spec.storage_uri.as_deref()),
            Some("pvc://models/llama")
        );

        let model = PredictorSpec {
            model: Some(ModelSpec {
                extension: PredictorExtensionSpec {
                    storage_uri: Some("s3://bucket/model".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            model
                .built_in_extension()
                .and_then(|spec| spec.storage_uri.as_deref()),
            Some("s3://bucket/model")
        );

        let custom = PredictorSpec {
            containers: vec![container(INFERENCE_SERVICE_CONTAINER_NAME)],
            ..Default::default()
        };
        assert!(custom.built_in_extension().is_none());
    }

    #[test]
    fn collocated_transformer_is_not_a_custom_predictor() {
        let predictor = PredictorSpec {
            model: Some(ModelSpec {
                model_format: ModelFormat {
                    name: "sklearn".to_string(),
                    version: None,
                },
                ..Default::default()
            }),
            containers: vec![container(TRANSFORMER_CONTAINER_NAME)],
            ..Default::default()
        };

        let implementations = predictor.implementations();
        assert_eq!(implementations.len(), 1);
        assert_eq!(implementations[0].name(), "model");
    }

    #[test]
    fn kserve_container_is_a_custom_predictor() {
        let predictor = PredictorSpec {
            containers: vec![container(INFERENCE_SERVICE_CONTAINER_NAME)],
            ..Default::default()
        };

        assert!(matches!(
            predictor.implementations().as_slice(),
            [Implementation::Custom(c)] if c.name == INFERENCE_SERVICE_CONTAINER_NAME
        ));
    }

    #[test]
    fn explainer_with_art_and_container_yields_two() {
        let explainer = ExplainerSpec {
            art: Some(ArtExplainerSpec {
                type_: ArtExplainerType::SquareAttack,
                storage_uri: None,
                runtime_version: None,
                config: BTreeMap::new(),
            }),
            containers: vec![container("explainer")],
            ..Default::default()
        };

        assert_eq!(explainer.implementations().len(), 2);
    }

    #[test]
    fn predictor_extension_fields_are_flattened() {
        let predictor: PredictorSpec = serde_json::from_str(
            r#"{
                "minReplicas": 1,
                "scaleMetric": "cpu",
                "scaleTarget": 80,
                "model": {
                    "modelFormat": {"name": "sklearn"},
                    "storageUri": "gs://bucket/model"
                }
            }"#,
        )
        .expect("should deserialize predictor");

        assert_eq!(predictor.extension.min_replicas, Some(1));
        assert_eq!(predictor.extension.scale_metric, Some(ScaleMetric::Cpu));
        assert_eq!(
            predictor
                .model
                .as_ref()
                .and_then(|m| m.extension.storage_uri.as_deref()),
            Some("gs://bucket/model")
        );
    }
}

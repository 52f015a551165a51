use std::path::Path;

use api_types::AutoscalerClass;
use api_types::ScaleMetric;
use error_stack::Report;
use error_stack::ResultExt;
use serde::Deserialize;
use utils::gpu::DEFAULT_GPU_RESOURCE_TYPES;

use super::ConfigError;

/// Policy allow-lists consulted by the validation engine.
///
/// Built once at process start and shared read-only by every admission call.
/// The YAML form uses camelCase keys; any key left out keeps its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Values accepted in the `serving.kserve.io/autoscalerClass` annotation
    pub autoscaler_classes: Vec<AutoscalerClass>,
    /// Metrics the HPA backend can scale on
    pub hpa_metrics: Vec<ScaleMetric>,
    /// Resource metrics the KEDA backend can scale on
    pub keda_metrics: Vec<ScaleMetric>,
    /// External metric backends KEDA can query
    pub keda_metric_backends: Vec<String>,
    /// Metrics the Knative pod autoscaler can scale on
    pub kpa_metrics: Vec<ScaleMetric>,
    /// GPU resource names recognized on multi-node predictors
    pub gpu_resource_types: Vec<String>,
    /// Extra GPU resource names appended to `gpu_resource_types` on load
    pub additional_gpu_resource_types: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            autoscaler_classes: vec![
                AutoscalerClass::Hpa,
                AutoscalerClass::Keda,
                AutoscalerClass::Kpa,
                AutoscalerClass::External,
            ],
            hpa_metrics: vec![ScaleMetric::Cpu, ScaleMetric::Memory],
            keda_metrics: vec![ScaleMetric::Cpu, ScaleMetric::Memory],
            keda_metric_backends: vec![
                "prometheus".to_string(),
                "graphite".to_string(),
                "opentelemetry".to_string(),
            ],
            kpa_metrics: vec![ScaleMetric::Concurrency, ScaleMetric::Rps],
            gpu_resource_types: DEFAULT_GPU_RESOURCE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            additional_gpu_resource_types: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    /// Parse a policy document.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Parse`] if the YAML is malformed, has unknown keys, or
    ///   names an unknown metric or autoscaler class
    pub fn from_yaml(yaml: &str) -> Result<Self, Report<ConfigError>> {
        let config: Self = serde_yaml::from_str(yaml).change_context(ConfigError::Parse)?;
        Ok(config.merged())
    }

    /// Load the policy document at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::Parse`] if its content is invalid
    pub async fn load(path: &Path) -> Result<Self, Report<ConfigError>> {
        tracing::info!("Loading validator policy from {:?}", path);

        let yaml = tokio::fs::read_to_string(path)
            .await
            .change_context_lazy(|| ConfigError::Read {
                path: path.display().to_string(),
            })?;

        let config = Self::from_yaml(&yaml)
            .attach_printable_lazy(|| format!("policy file: {}", path.display()))?;

        tracing::info!(
            autoscaler_classes = ?config.autoscaler_classes,
            gpu_resource_types = ?config.gpu_resource_types,
            "Loaded validator policy"
        );

        Ok(config)
    }

    /// Load the policy at `path`, or the built-in defaults when no path is given.
    ///
    /// # Errors
    ///
    /// See [`ValidatorConfig::load`].
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Report<ConfigError>> {
        match path {
            Some(path) => Self::load(path).await,
            None => {
                tracing::info!("No validator policy file configured, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn merged(mut self) -> Self {
        for extra in std::mem::take(&mut self.additional_gpu_resource_types) {
            if !self.gpu_resource_types.contains(&extra) {
                self.gpu_resource_types.push(extra);
            }
        }
        self
    }
}

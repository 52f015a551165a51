use std::str::FromStr;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::UnknownVariant;

/// Metric a component scales on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMetric {
    Cpu,
    Memory,
    Concurrency,
    Rps,
}

impl ScaleMetric {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Concurrency => "concurrency",
            Self::Rps => "rps",
        }
    }
}

impl std::fmt::Display for ScaleMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScaleMetric {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "memory" => Ok(Self::Memory),
            "concurrency" => Ok(Self::Concurrency),
            "rps" => Ok(Self::Rps),
            _ => Err(UnknownVariant {
                kind: "scale metric",
                value: s.to_string(),
            }),
        }
    }
}

/// Autoscaling backend named by the `serving.kserve.io/autoscalerClass` annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AutoscalerClass {
    Hpa,
    Keda,
    Kpa,
    External,
}

impl AutoscalerClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hpa => "hpa",
            Self::Keda => "keda",
            Self::Kpa => "kpa",
            Self::External => "external",
        }
    }
}

impl std::fmt::Display for AutoscalerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoscalerClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hpa" => Ok(Self::Hpa),
            "keda" => Ok(Self::Keda),
            "kpa" => Ok(Self::Kpa),
            "external" => Ok(Self::External),
            _ => Err(UnknownVariant {
                kind: "autoscaler class",
                value: s.to_string(),
            }),
        }
    }
}

/// Multi-metric autoscaling configuration, consumed by KEDA.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricsSpec>,
}

/// Discriminant of a [`MetricsSpec`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MetricSourceType {
    Resource,
    External,
    PodMetric,
}

impl std::fmt::Display for MetricSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One autoscaling metric entry.
///
/// The `type` tag selects which of the payload fields is meaningful. The wire
/// shape does not prevent a mismatched payload, so consumers go through
/// [`MetricsSpec::source`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSpec {
    #[serde(rename = "type")]
    pub type_: MetricSourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceMetricSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalMetricSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_metric: Option<PodMetricSource>,
}

/// Borrowed view of a metric entry whose tag and payload agree.
#[derive(Debug, Clone, Copy)]
pub enum MetricSource<'a> {
    Resource(&'a ResourceMetricSource),
    External(&'a ExternalMetricSource),
    PodMetric(&'a PodMetricSource),
}

impl MetricsSpec {
    /// Returns the payload selected by the `type` tag, or `None` when it is missing.
    pub fn source(&self) -> Option<MetricSource<'_>> {
        match self.type_ {
            MetricSourceType::Resource => self.resource.as_ref().map(MetricSource::Resource),
            MetricSourceType::External => self.external.as_ref().map(MetricSource::External),
            MetricSourceType::PodMetric => self.pod_metric.as_ref().map(MetricSource::PodMetric),
        }
    }
}

/// Resource the `Resource` metric source refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMetric {
    Cpu,
    Memory,
}

impl ResourceMetric {
    /// The equivalent [`ScaleMetric`], used when checking against metric allow-lists.
    pub const fn as_scale_metric(&self) -> ScaleMetric {
        match self {
            Self::Cpu => ScaleMetric::Cpu,
            Self::Memory => ScaleMetric::Memory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetricSource {
    pub name: ResourceMetric,
    #[serde(default)]
    pub target: MetricTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMetricSource {
    pub metric: ExternalMetrics,
    #[serde(default)]
    pub target: MetricTarget,
}

/// Query against an external metrics backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMetrics {
    /// Metrics backend identifier, e.g. `prometheus`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodMetricSource {
    pub metric: ExternalMetrics,
    #[serde(default)]
    pub target: MetricTarget,
}

/// Kind of target a metric is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MetricTargetType {
    #[default]
    Utilization,
    Value,
    AverageValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricTarget {
    #[serde(rename = "type", default)]
    pub type_: MetricTargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_value: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_utilization: Option<i32>,
}

//! Per-component autoscaling bounds, checked by the backend that will scale it.

use std::collections::BTreeMap;

use api_types::AutoScalingSpec;
use api_types::AutoscalerClass;
use api_types::ComponentExtensionSpec;
use api_types::MetricSource;
use api_types::ResourceMetric;
use api_types::ScaleMetric;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use utils::quantity::MEBIBYTE;
use utils::quantity::parse_quantity;

use crate::config::ValidatorConfig;
use crate::constants::AUTOSCALER_CLASS_ANNOTATION;
use crate::constants::DEPLOYMENT_MODE_ANNOTATION;
use crate::constants::DeploymentMode;
use crate::constants::KNATIVE_AUTOSCALER_CLASS_ANNOTATION;
use crate::constants::KNATIVE_HPA_CLASS;
use crate::error::IN_KEDA;
use crate::error::ValidationError;

/// Autoscaler implementation that will scale a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingBackend {
    Hpa,
    Keda,
    Kpa,
}

/// Picks the backend whose bounds apply, first match wins:
///
/// | condition | backend |
/// |---|---|
/// | class `keda` | KEDA |
/// | class `external` | none |
/// | raw deployment, Knative HPA class, or class `hpa` | HPA |
/// | otherwise | KPA |
pub fn select_scaling_backend(annotations: &BTreeMap<String, String>) -> Option<ScalingBackend> {
    let annotation = |key: &str| annotations.get(key).map(String::as_str);
    let class = annotation(AUTOSCALER_CLASS_ANNOTATION);

    if class == Some(AutoscalerClass::Keda.as_str()) {
        return Some(ScalingBackend::Keda);
    }
    if class == Some(AutoscalerClass::External.as_str()) {
        return None;
    }

    let raw = DeploymentMode::from_annotation(annotation(DEPLOYMENT_MODE_ANNOTATION))
        == DeploymentMode::RawDeployment;
    let knative_hpa = annotation(KNATIVE_AUTOSCALER_CLASS_ANNOTATION) == Some(KNATIVE_HPA_CLASS);
    if raw || knative_hpa || class == Some(AutoscalerClass::Hpa.as_str()) {
        return Some(ScalingBackend::Hpa);
    }

    Some(ScalingBackend::Kpa)
}

impl ScalingBackend {
    /// Checks a component extension against this backend's bounds.
    pub fn validate(
        self,
        extension: &ComponentExtensionSpec,
        config: &ValidatorConfig,
    ) -> Result<(), Report<ValidationError>> {
        match self {
            Self::Hpa => validate_hpa(extension, config),
            Self::Keda => validate_keda(extension, config),
            Self::Kpa => validate_kpa(extension, config),
        }
    }
}

fn validate_hpa(
    extension: &ComponentExtensionSpec,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    let metric = extension.scale_metric.unwrap_or(ScaleMetric::Cpu);
    ensure_allowed(metric, &config.hpa_metrics, "")?;
    validate_scale_target(metric, extension.scale_target)
}

fn validate_keda(
    extension: &ComponentExtensionSpec,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    let metric = extension.scale_metric.unwrap_or(ScaleMetric::Cpu);
    if extension.scale_metric.is_some() || extension.auto_scaling.is_none() {
        ensure_allowed(metric, &config.keda_metrics, IN_KEDA)?;
    }
    validate_scale_target(metric, extension.scale_target)?;

    match &extension.auto_scaling {
        Some(auto_scaling) => validate_auto_scaling_targets(auto_scaling),
        None => Ok(()),
    }
}

fn validate_kpa(
    extension: &ComponentExtensionSpec,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    if extension.deployment_strategy.is_some() {
        return Err(Report::new(ValidationError::DeploymentStrategyNotSupported));
    }

    let metric = extension.scale_metric.unwrap_or(ScaleMetric::Concurrency);
    ensure_allowed(metric, &config.kpa_metrics, "")?;
    validate_scale_target(metric, extension.scale_target)
}

fn ensure_allowed(
    metric: ScaleMetric,
    allowed: &[ScaleMetric],
    backend: &'static str,
) -> Result<(), Report<ValidationError>> {
    if !allowed.contains(&metric) {
        return Err(Report::new(ValidationError::UnsupportedMetric {
            metric: metric.to_string(),
            backend,
        }));
    }
    Ok(())
}

fn validate_scale_target(
    metric: ScaleMetric,
    target: Option<i32>,
) -> Result<(), Report<ValidationError>> {
    let Some(target) = target else {
        return Ok(());
    };

    match metric {
        ScaleMetric::Cpu if !(1..=100).contains(&target) => {
            Err(Report::new(ValidationError::TargetUtilizationOutOfRange))
        }
        ScaleMetric::Memory if target < 1 => {
            Err(Report::new(ValidationError::MemoryTargetTooSmall))
        }
        ScaleMetric::Rps if target < 1 => Err(Report::new(ValidationError::RpsTargetTooSmall)),
        _ => Ok(()),
    }
}

fn validate_auto_scaling_targets(
    auto_scaling: &AutoScalingSpec,
) -> Result<(), Report<ValidationError>> {
    for entry in &auto_scaling.metrics {
        match entry.source() {
            Some(MetricSource::Resource(resource)) => match resource.name {
                ResourceMetric::Cpu => {
                    let in_range = resource
                        .target
                        .average_utilization
                        .is_some_and(|u| (1..=100).contains(&u));
                    if !in_range {
                        return Err(Report::new(ValidationError::TargetUtilizationOutOfRange));
                    }
                }
                ResourceMetric::Memory => {
                    let Some(value) = &resource.target.average_value else {
                        return Err(Report::new(ValidationError::MemoryTargetTooSmall));
                    };
                    if quantity(value)? < MEBIBYTE {
                        return Err(Report::new(ValidationError::MemoryTargetTooSmall));
                    }
                }
            },
            Some(MetricSource::External(external)) => {
                if external.metric.query.is_empty() {
                    return Err(Report::new(ValidationError::EmptyExternalQuery));
                }
                let Some(value) = &external.target.value else {
                    return Err(Report::new(ValidationError::MissingExternalThreshold));
                };
                quantity(value)?;
            }
            Some(MetricSource::PodMetric(_)) | None => {
                return Err(Report::new(ValidationError::UnknownMetricSourceType {
                    class: AutoscalerClass::Keda.to_string(),
                    source_type: entry.type_.to_string(),
                }));
            }
        }
    }
    Ok(())
}

fn quantity(value: &Quantity) -> Result<f64, Report<ValidationError>> {
    parse_quantity(&value.0).change_context_lazy(|| ValidationError::InvalidQuantity {
        value: value.0.clone(),
    })
}

#[cfg(test)]
mod tests {
    use api_types::ExternalMetricSource;
    use api_types::ExternalMetrics;
    use api_types::MetricSourceType;
    use api_types::MetricTarget;
    use api_types::MetricsSpec;
    use api_types::ResourceMetricSource;
    use k8s_openapi::api::apps::v1::DeploymentStrategy;
    use similar_asserts::assert_eq;

    use super::*;

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn rejection(backend: ScalingBackend, extension: &ComponentExtensionSpec) -> ValidationError {
        backend
            .validate(extension, &ValidatorConfig::default())
            .expect_err("should be rejected")
            .current_context()
            .clone()
    }

    fn resource_entry(name: ResourceMetric, target: MetricTarget) -> MetricsSpec {
        MetricsSpec {
            type_: MetricSourceType::Resource,
            resource: Some(ResourceMetricSource { name, target }),
            external: None,
            pod_metric: None,
        }
    }

    fn external_entry(query: &str, value: Option<&str>) -> MetricsSpec {
        MetricsSpec {
            type_: MetricSourceType::External,
            resource: None,
            external: Some(ExternalMetricSource {
                metric: ExternalMetrics {
                    backend: Some("prometheus".to_string()),
                    query: query.to_string(),
                    ..Default::default()
                },
                target: MetricTarget {
                    value: value.map(|v| Quantity(v.to_string())),
                    ..Default::default()
                },
            }),
            pod_metric: None,
        }
    }

    fn keda_extension(metrics: Vec<MetricsSpec>) -> ComponentExtensionSpec {
        ComponentExtensionSpec {
            auto_scaling: Some(AutoScalingSpec { metrics }),
            ..Default::default()
        }
    }

    #[test]
    fn backend_selection_table() {
        let cases = [
            (vec![], Some(ScalingBackend::Kpa)),
            (vec![(AUTOSCALER_CLASS_ANNOTATION, "keda")], Some(ScalingBackend::Keda)),
            (
                vec![
                    (AUTOSCALER_CLASS_ANNOTATION, "keda"),
                    (DEPLOYMENT_MODE_ANNOTATION, "RawDeployment"),
                ],
                Some(ScalingBackend::Keda),
            ),
            (vec![(AUTOSCALER_CLASS_ANNOTATION, "external")], None),
            (vec![(AUTOSCALER_CLASS_ANNOTATION, "hpa")], Some(ScalingBackend::Hpa)),
            (
                vec![(DEPLOYMENT_MODE_ANNOTATION, "RawDeployment")],
                Some(ScalingBackend::Hpa),
            ),
            (
                vec![(KNATIVE_AUTOSCALER_CLASS_ANNOTATION, KNATIVE_HPA_CLASS)],
                Some(ScalingBackend::Hpa),
            ),
            (vec![(AUTOSCALER_CLASS_ANNOTATION, "kpa")], Some(ScalingBackend::Kpa)),
        ];

        for (pairs, expected) in cases {
            assert_eq!(
                select_scaling_backend(&annotations(&pairs)),
                expected,
                "{pairs:?}"
            );
        }
    }

    #[test]
    fn hpa_cpu_target_must_be_a_percentage() {
        let extension = ComponentExtensionSpec {
            scale_metric: Some(ScaleMetric::Cpu),
            scale_target: Some(150),
            ..Default::default()
        };
        let err = rejection(ScalingBackend::Hpa, &extension);
        assert_eq!(
            err.to_string(),
            "the target utilization percentage should be a [1-100] integer"
        );
    }

    #[test]
    fn hpa_memory_target_only_has_a_lower_bound() {
        let extension = ComponentExtensionSpec {
            scale_metric: Some(ScaleMetric::Memory),
            scale_target: Some(150),
            ..Default::default()
        };
        assert!(
            ScalingBackend::Hpa
                .validate(&extension, &ValidatorConfig::default())
                .is_ok()
        );

        let extension = ComponentExtensionSpec {
            scale_target: Some(0),
            ..extension
        };
        assert_eq!(
            rejection(ScalingBackend::Hpa, &extension),
            ValidationError::MemoryTargetTooSmall
        );
    }

    #[test]
    fn hpa_rejects_knative_metrics() {
        let extension = ComponentExtensionSpec {
            scale_metric: Some(ScaleMetric::Rps),
            ..Default::default()
        };
        assert_eq!(
            rejection(ScalingBackend::Hpa, &extension),
            ValidationError::UnsupportedMetric {
                metric: "rps".to_string(),
                backend: ""
            }
        );
    }

    #[test]
    fn kpa_defaults_to_concurrency() {
        let extension = ComponentExtensionSpec {
            scale_target: Some(500),
            ..Default::default()
        };
        assert!(
            ScalingBackend::Kpa
                .validate(&extension, &ValidatorConfig::default())
                .is_ok()
        );
    }

    #[test]
    fn kpa_rejects_cpu_and_small_rps_targets() {
        let cpu = ComponentExtensionSpec {
            scale_metric: Some(ScaleMetric::Cpu),
            ..Default::default()
        };
        assert!(matches!(
            rejection(ScalingBackend::Kpa, &cpu),
            ValidationError::UnsupportedMetric { .. }
        ));

        let rps = ComponentExtensionSpec {
            scale_metric: Some(ScaleMetric::Rps),
            scale_target: Some(0),
            ..Default::default()
        };
        assert_eq!(
            rejection(ScalingBackend::Kpa, &rps),
            ValidationError::RpsTargetTooSmall
        );
    }

    #[test]
    fn kpa_rejects_deployment_strategy() {
        let extension = ComponentExtensionSpec {
            deployment_strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            rejection(ScalingBackend::Kpa, &extension),
            ValidationError::DeploymentStrategyNotSupported
        );
    }

    #[test]
    fn keda_cpu_utilization_must_be_set_and_in_range() {
        for utilization in [None, Some(0), Some(101)] {
            let extension = keda_extension(vec![resource_entry(
                ResourceMetric::Cpu,
                MetricTarget {
                    average_utilization: utilization,
                    ..Default::default()
                },
            )]);
            assert_eq!(
                rejection(ScalingBackend::Keda, &extension),
                ValidationError::TargetUtilizationOutOfRange,
                "{utilization:?}"
            );
        }
    }

    #[test]
    fn keda_memory_average_value_must_reach_one_mebibyte() {
        let target = |value: &str| MetricTarget {
            average_value: Some(Quantity(value.to_string())),
            ..Default::default()
        };

        let ok = keda_extension(vec![resource_entry(ResourceMetric::Memory, target("1Mi"))]);
        assert!(
            ScalingBackend::Keda
                .validate(&ok, &ValidatorConfig::default())
                .is_ok()
        );

        let small = keda_extension(vec![resource_entry(ResourceMetric::Memory, target("512Ki"))]);
        assert_eq!(
            rejection(ScalingBackend::Keda, &small),
            ValidationError::MemoryTargetTooSmall
        );

        let garbage = keda_extension(vec![resource_entry(ResourceMetric::Memory, target("lots"))]);
        assert_eq!(
            rejection(ScalingBackend::Keda, &garbage),
            ValidationError::InvalidQuantity {
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn keda_external_entry_needs_query_and_threshold() {
        let no_query = keda_extension(vec![external_entry("", Some("10"))]);
        assert_eq!(
            rejection(ScalingBackend::Keda, &no_query),
            ValidationError::EmptyExternalQuery
        );

        let no_value = keda_extension(vec![external_entry("sum(requests)", None)]);
        assert_eq!(
            rejection(ScalingBackend::Keda, &no_value),
            ValidationError::MissingExternalThreshold
        );

        let ok = keda_extension(vec![external_entry("sum(requests)", Some("10"))]);
        assert!(
            ScalingBackend::Keda
                .validate(&ok, &ValidatorConfig::default())
                .is_ok()
        );
    }

    #[test]
    fn keda_bounds_scale_target_alongside_auto_scaling() {
        let extension = ComponentExtensionSpec {
            scale_target: Some(150),
            ..keda_extension(vec![resource_entry(
                ResourceMetric::Cpu,
                MetricTarget {
                    average_utilization: Some(50),
                    ..Default::default()
                },
            )])
        };
        assert_eq!(
            rejection(ScalingBackend::Keda, &extension),
            ValidationError::TargetUtilizationOutOfRange
        );

        let extension = ComponentExtensionSpec {
            scale_target: Some(80),
            ..extension
        };
        assert!(
            ScalingBackend::Keda
                .validate(&extension, &ValidatorConfig::default())
                .is_ok()
        );
    }

    #[test]
    fn keda_checks_entries_after_the_first() {
        let extension = keda_extension(vec![
            external_entry("sum(requests)", Some("10")),
            external_entry("", Some("10")),
        ]);
        assert_eq!(
            rejection(ScalingBackend::Keda, &extension),
            ValidationError::EmptyExternalQuery
        );
    }
}

use api_types::AutoScalingSpec;
use api_types::AutoscalerClass;
use api_types::InferenceService;
use api_types::MetricSource;
use api_types::ScaleMetric;
use error_stack::Report;

use crate::config::ValidatorConfig;
use crate::constants::AUTOSCALER_CLASS_ANNOTATION;
use crate::constants::AUTOSCALER_METRICS_ANNOTATION;
use crate::constants::TARGET_UTILIZATION_PERCENTAGE_ANNOTATION;
use crate::error::IN_KEDA;
use crate::error::ValidationError;

/// Checks the autoscaler class annotation and the class-level metric settings.
///
/// An absent annotation is accepted. KEDA settings are read from the
/// predictor's extension.
pub fn validate_autoscaler_class(
    isvc: &InferenceService,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    let Some(value) = isvc.annotation(AUTOSCALER_CLASS_ANNOTATION) else {
        return Ok(());
    };

    let class = value
        .parse::<AutoscalerClass>()
        .ok()
        .filter(|class| config.autoscaler_classes.contains(class))
        .ok_or_else(|| {
            Report::new(ValidationError::UnsupportedAutoscalerClass {
                class: value.to_string(),
            })
        })?;

    match class {
        AutoscalerClass::External | AutoscalerClass::Kpa => Ok(()),
        AutoscalerClass::Hpa => validate_hpa_metrics_annotation(isvc, config),
        AutoscalerClass::Keda => validate_keda_class(isvc, config),
    }
}

fn validate_hpa_metrics_annotation(
    isvc: &InferenceService,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    let Some(metric) = isvc.annotation(AUTOSCALER_METRICS_ANNOTATION) else {
        return Ok(());
    };

    let allowed = metric
        .parse::<ScaleMetric>()
        .is_ok_and(|metric| config.hpa_metrics.contains(&metric));
    if !allowed {
        return Err(Report::new(ValidationError::UnsupportedMetric {
            metric: metric.to_string(),
            backend: "",
        }));
    }
    Ok(())
}

fn validate_keda_class(
    isvc: &InferenceService,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    let extension = &isvc.spec.predictor.extension;

    match (&extension.scale_metric, &extension.auto_scaling) {
        (Some(_), Some(_)) => Err(Report::new(ValidationError::ScaleMetricConflict)),
        (Some(metric), None) => validate_keda_metric(*metric, config),
        (None, Some(auto_scaling)) => validate_keda_auto_scaling(auto_scaling, config),
        (None, None) => Ok(()),
    }
}

fn validate_keda_metric(
    metric: ScaleMetric,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    if !config.keda_metrics.contains(&metric) {
        return Err(Report::new(ValidationError::UnsupportedMetric {
            metric: metric.to_string(),
            backend: IN_KEDA,
        }));
    }
    Ok(())
}

fn validate_keda_auto_scaling(
    auto_scaling: &AutoScalingSpec,
    config: &ValidatorConfig,
) -> Result<(), Report<ValidationError>> {
    for entry in &auto_scaling.metrics {
        match entry.source() {
            Some(MetricSource::Resource(resource)) => {
                validate_keda_metric(resource.name.as_scale_metric(), config)?;
            }
            Some(MetricSource::External(external)) => {
                let backend = external.metric.backend.as_deref().unwrap_or_default();
                if !config.keda_metric_backends.iter().any(|b| b == backend) {
                    return Err(Report::new(ValidationError::UnsupportedMetricBackend {
                        backend: backend.to_string(),
                    }));
                }
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

/// Checks the target utilization annotation is an integer in `[1, 100]`.
pub fn validate_target_utilization(isvc: &InferenceService) -> Result<(), Report<ValidationError>> {
    let Some(value) = isvc.annotation(TARGET_UTILIZATION_PERCENTAGE_ANNOTATION) else {
        return Ok(());
    };

    match value.parse::<i64>() {
        Ok(percentage) if (1..=100).contains(&percentage) => Ok(()),
        _ => Err(Report::new(ValidationError::TargetUtilizationOutOfRange)),
    }
}

use api_types::Component;
use api_types::ComponentExtensionSpec;
use api_types::Implementation;
use api_types::InferenceService;
use error_stack::Report;

use super::scaling::ScalingBackend;
use crate::config::ValidatorConfig;
use crate::constants::STORAGE_URI_ENV;
use crate::constants::SUPPORTED_STORAGE_URI_PREFIXES;
use crate::constants::TRANSFORMER_CONTAINER_NAME;
use crate::error::ValidationError;
use crate::resolver::CapabilityResolver;

/// Runs the per-component checks: exactly one implementation, the
/// implementation itself, the extension bounds, then the scaling backend bounds.
pub fn validate_component(
    component: &dyn Component,
    backend: Option<ScalingBackend>,
    config: &ValidatorConfig,
    resolver: &impl CapabilityResolver,
) -> Result<(), Report<ValidationError>> {
    let implementations = component.implementations();
    let [implementation] = implementations.as_slice() else {
        return Err(Report::new(ValidationError::ExactlyOneImplementation {
            component: component.kind().to_string(),
            allowed: component.implementation_names().to_vec(),
            found: implementations.len(),
        }));
    };

    validate_implementation(component, implementation, resolver)?;

    let extension = component.extensions();
    validate_extension(extension)?;

    match backend {
        Some(backend) => backend.validate(extension, config),
        None => Ok(()),
    }
}

fn validate_implementation(
    component: &dyn Component,
    implementation: &Implementation<'_>,
    resolver: &impl CapabilityResolver,
) -> Result<(), Report<ValidationError>> {
    match implementation {
        Implementation::Framework { spec, .. } => validate_storage_uri(spec.storage_uri.as_deref()),
        Implementation::Model(model) => {
            if model.model_format.name.is_empty() {
                return Err(Report::new(ValidationError::MissingModelFormat {
                    component: component.kind().to_string(),
                }));
            }
            validate_storage_uri(model.extension.storage_uri.as_deref())
        }
        Implementation::Custom(container) => {
            let env = container.env.as_deref().unwrap_or_default();
            validate_storage_uri(resolver.lookup_env_var(env, STORAGE_URI_ENV))
        }
        Implementation::Art(art) => validate_storage_uri(art.storage_uri.as_deref()),
    }
}

/// A storage URI must use a supported scheme or be a local path.
fn validate_storage_uri(uri: Option<&str>) -> Result<(), Report<ValidationError>> {
    let Some(uri) = uri else {
        return Ok(());
    };
    if !uri.contains("://") {
        return Ok(());
    }
    if SUPPORTED_STORAGE_URI_PREFIXES
        .iter()
        .any(|prefix| uri.starts_with(prefix))
    {
        return Ok(());
    }

    Err(Report::new(ValidationError::UnsupportedStorageUri {
        uri: uri.to_string(),
        supported: SUPPORTED_STORAGE_URI_PREFIXES.to_vec(),
    }))
}

fn validate_extension(extension: &ComponentExtensionSpec) -> Result<(), Report<ValidationError>> {
    let min_replicas = extension.min_replicas.unwrap_or_default();

    if min_replicas < 0 {
        return Err(Report::new(ValidationError::MinReplicasNegative));
    }
    if extension.max_replicas < 0 {
        return Err(Report::new(ValidationError::MaxReplicasNegative));
    }
    if extension.max_replicas != 0 && min_replicas > extension.max_replicas {
        return Err(Report::new(ValidationError::MinReplicasAboveMax));
    }
    if extension.container_concurrency.is_some_and(|cc| cc < 0) {
        return Err(Report::new(ValidationError::ContainerConcurrencyNegative));
    }
    if extension.timeout.is_some_and(|timeout| timeout < 0) {
        return Err(Report::new(ValidationError::TimeoutNegative));
    }
    Ok(())
}

/// A transformer collocated in the predictor pod shares its model volume and
/// must not point at its own storage.
pub fn validate_collocation_storage_uri(
    isvc: &InferenceService,
    resolver: &impl CapabilityResolver,
) -> Result<(), Report<ValidationError>> {
    let Some(container) = isvc.spec.predictor.container(TRANSFORMER_CONTAINER_NAME) else {
        return Ok(());
    };

    let env = container.env.as_deref().unwrap_or_default();
    if resolver.lookup_env_var(env, STORAGE_URI_ENV).is_some() {
        return Err(Report::new(ValidationError::CollocatedStorageUri));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::resolver::ClusterCapabilities;
    use crate::validation::fixtures::isvc_from_yaml;

    fn predictor_rejection(yaml: &str) -> ValidationError {
        let isvc = isvc_from_yaml(yaml);
        validate_component(
            &isvc.spec.predictor,
            None,
            &ValidatorConfig::default(),
            &ClusterCapabilities::default(),
        )
        .expect_err("should be rejected")
        .current_context()
        .clone()
    }

    fn predictor_accepted(yaml: &str) -> bool {
        let isvc = isvc_from_yaml(yaml);
        validate_component(
            &isvc.spec.predictor,
            None,
            &ValidatorConfig::default(),
            &ClusterCapabilities::default(),
        )
        .is_ok()
    }

    #[test]
    fn predictor_needs_exactly_one_implementation() {
        let none = r#"
metadata:
  name: empty
spec:
  predictor:
    minReplicas: 1
"#;
        assert!(matches!(
            predictor_rejection(none),
            ValidationError::ExactlyOneImplementation { found: 0, .. }
        ));

        let two = r#"
metadata:
  name: two
spec:
  predictor:
    sklearn:
      storageUri: gs://bucket/sklearn
    xgboost:
      storageUri: gs://bucket/xgboost
"#;
        let err = predictor_rejection(two);
        assert!(matches!(
            err,
            ValidationError::ExactlyOneImplementation { found: 2, .. }
        ));
        assert!(err.to_string().contains("in Predictor"));

        let one = r#"
metadata:
  name: one
spec:
  predictor:
    sklearn:
      storageUri: gs://bucket/sklearn
"#;
        assert!(predictor_accepted(one));
    }

    #[test]
    fn collocated_transformer_container_is_not_an_implementation() {
        let yaml = r#"
metadata:
  name: collocated
spec:
  predictor:
    containers:
      - name: kserve-container
        image: example/predictor
      - name: transformer-container
        image: example/transformer
"#;
        assert!(predictor_accepted(yaml));
    }

    #[test]
    fn unsupported_storage_scheme_is_rejected() {
        let yaml = r#"
metadata:
  name: ftp
spec:
  predictor:
    sklearn:
      storageUri: ftp://host/model
"#;
        assert!(matches!(
            predictor_rejection(yaml),
            ValidationError::UnsupportedStorageUri { .. }
        ));

        let local = yaml.replace("ftp://host/model", "/mnt/models/sklearn");
        assert!(predictor_accepted(&local));
    }

    #[test]
    fn custom_container_storage_env_is_checked() {
        let yaml = r#"
metadata:
  name: custom
spec:
  predictor:
    containers:
      - name: kserve-container
        image: example/predictor
        env:
          - name: STORAGE_URI
            value: ftp://host/model
"#;
        assert!(matches!(
            predictor_rejection(yaml),
            ValidationError::UnsupportedStorageUri { .. }
        ));
    }

    #[test]
    fn model_needs_format_name() {
        let yaml = r#"
metadata:
  name: model
spec:
  predictor:
    model:
      modelFormat:
        name: ""
      storageUri: s3://bucket/model
"#;
        assert_eq!(
            predictor_rejection(yaml),
            ValidationError::MissingModelFormat {
                component: "Predictor".to_string()
            }
        );
    }

    #[test]
    fn replica_bounds() {
        let base = r#"
metadata:
  name: replicas
spec:
  predictor:
    REPLICAS
    sklearn:
      storageUri: gs://bucket/sklearn
"#;
        let cases = [
            ("minReplicas: -1", Some(ValidationError::MinReplicasNegative)),
            ("maxReplicas: -1", Some(ValidationError::MaxReplicasNegative)),
            (
                "minReplicas: 3\n    maxReplicas: 2",
                Some(ValidationError::MinReplicasAboveMax),
            ),
            ("minReplicas: 3\n    maxReplicas: 0", None),
            (
                "containerConcurrency: -1",
                Some(ValidationError::ContainerConcurrencyNegative),
            ),
            ("timeout: -5", Some(ValidationError::TimeoutNegative)),
        ];

        for (fields, expected) in cases {
            let yaml = base.replace("REPLICAS", fields);
            match expected {
                Some(expected) => assert_eq!(predictor_rejection(&yaml), expected, "{fields}"),
                None => assert!(predictor_accepted(&yaml), "{fields}"),
            }
        }
    }

    #[test]
    fn transformer_and_explainer_implementations() {
        let isvc = isvc_from_yaml(
            r#"
metadata:
  name: roles
spec:
  predictor:
    sklearn: {}
  transformer:
    containers: []
  explainer:
    art:
      type: SquareAttack
    containers:
      - name: explainer
        image: example/explainer
"#,
        );
        let config = ValidatorConfig::default();
        let resolver = ClusterCapabilities::default();

        let transformer = isvc.spec.transformer.as_ref().unwrap();
        let err = validate_component(transformer, None, &config, &resolver)
            .expect_err("transformer has no container");
        assert_eq!(
            err.current_context().to_string(),
            "exactly one of [containers] must be specified in Transformer, found 0"
        );

        let explainer = isvc.spec.explainer.as_ref().unwrap();
        let err = validate_component(explainer, None, &config, &resolver)
            .expect_err("explainer has two implementations");
        assert!(matches!(
            err.current_context(),
            ValidationError::ExactlyOneImplementation { found: 2, .. }
        ));
    }

    #[test]
    fn backend_bounds_apply_after_shape_checks() {
        let isvc = isvc_from_yaml(
            r#"
metadata:
  name: hpa
spec:
  predictor:
    scaleMetric: cpu
    scaleTarget: 150
    sklearn: {}
"#,
        );
        let err = validate_component(
            &isvc.spec.predictor,
            Some(ScalingBackend::Hpa),
            &ValidatorConfig::default(),
            &ClusterCapabilities::default(),
        )
        .expect_err("cpu target above 100");
        assert_eq!(
            err.current_context(),
            &ValidationError::TargetUtilizationOutOfRange
        );
    }

    #[test]
    fn collocated_transformer_must_not_set_storage_uri() {
        let yaml = r#"
metadata:
  name: collocated
spec:
  predictor:
    containers:
      - name: kserve-container
        image: example/predictor
      - name: transformer-container
        image: example/transformer
        env:
          - name: STORAGE_URI
            value: s3://bucket/model
"#;
        let resolver = ClusterCapabilities::default();

        let err = validate_collocation_storage_uri(&isvc_from_yaml(yaml), &resolver)
            .expect_err("collocated transformer declares STORAGE_URI");
        assert_eq!(
            err.current_context().to_string(),
            "storage uri should not be specified in transformer container"
        );

        let without_env = yaml.replace(
            "        env:\n          - name: STORAGE_URI\n            value: s3://bucket/model\n",
            "",
        );
        assert!(validate_collocation_storage_uri(&isvc_from_yaml(&without_env), &resolver).is_ok());
    }
}

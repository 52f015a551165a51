use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::Component;
use crate::ExplainerSpec;
use crate::PredictorSpec;
use crate::TransformerSpec;

/// Desired state of an InferenceService.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "serving.kserve.io",
    version = "v1beta1",
    kind = "InferenceService",
    plural = "inferenceservices",
    shortname = "isvc",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceSpec {
    pub predictor: PredictorSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<TransformerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explainer: Option<ExplainerSpec>,
}

impl InferenceServiceSpec {
    /// Every populated component, predictor first.
    pub fn components(&self) -> Vec<&dyn Component> {
        let mut components: Vec<&dyn Component> = vec![&self.predictor];
        if let Some(transformer) = &self.transformer {
            components.push(transformer);
        }
        if let Some(explainer) = &self.explainer {
            components.push(explainer);
        }
        components
    }
}

impl InferenceService {
    /// Object name, or the empty string when the request carries none.
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Object annotations, empty when unset.
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.metadata.annotations.as_ref().unwrap_or(&EMPTY)
    }

    /// Looks up a single annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations().get(key).map(String::as_str)
    }
}

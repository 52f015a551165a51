use std::sync::Arc;

use api_types::InferenceService;
use kube::core::DynamicObject;
use kube::core::admission::AdmissionRequest;
use kube::core::admission::AdmissionResponse;
use kube::core::admission::AdmissionReview;
use kube::core::admission::Operation as AdmissionOperation;
use poem::handler;
use poem::web::Data;
use poem::web::Json;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::validation::InferenceServiceValidator;
use crate::validation::Operation;

/// Validate an InferenceService admission request
#[handler]
pub async fn validate_inference_service(
    Data(validator): Data<&Arc<InferenceServiceValidator>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(review_admission(validator, review).into_review())
}

#[handler]
pub fn healthz() -> &'static str {
    "ok"
}

/// Turns an admission review into the webhook's decision.
///
/// Requests that are not create or update are allowed untouched. Objects that
/// do not decode as an InferenceService are denied with the decode error.
pub fn review_admission(
    validator: &InferenceServiceValidator,
    review: AdmissionReview<DynamicObject>,
) -> AdmissionResponse {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid admission review: {e}");
            return AdmissionResponse::invalid(e.to_string());
        }
    };

    let mut response = AdmissionResponse::from(&request);

    let operation = match request.operation {
        AdmissionOperation::Create => Operation::Create,
        AdmissionOperation::Update => Operation::Update,
        AdmissionOperation::Delete => Operation::Delete,
        AdmissionOperation::Connect => {
            debug!(uid = %request.uid, "Ignoring connect request");
            return response;
        }
    };

    let new = match request.object.as_ref().map(decode).transpose() {
        Ok(Some(isvc)) => isvc,
        Ok(None) if operation == Operation::Delete => return response,
        Ok(None) => {
            warn!(uid = %request.uid, "Admission request carries no object");
            return response.deny("admission request carries no object");
        }
        Err(e) => {
            warn!(uid = %request.uid, name = %request.name, "Failed to decode InferenceService: {e}");
            return response.deny(format!("failed to decode InferenceService: {e}"));
        }
    };

    let old = request.old_object.as_ref().and_then(|object| {
        decode(object)
            .inspect_err(|e| debug!(uid = %request.uid, "Ignoring undecodable old object: {e}"))
            .ok()
    });

    match validator.validate(operation, old.as_ref(), &new) {
        Ok(warnings) => {
            info!(uid = %request.uid, name = new.name(), "InferenceService admitted");
            if !warnings.is_empty() {
                response.warnings = Some(warnings);
            }
            response
        }
        Err(report) => {
            info!(
                uid = %request.uid,
                name = new.name(),
                reason = %report.current_context(),
                "InferenceService denied"
            );
            response.deny(report.current_context().to_string())
        }
    }
}

fn decode(object: &DynamicObject) -> Result<InferenceService, serde_json::Error> {
    serde_json::to_value(object).and_then(serde_json::from_value)
}

//! Validating admission webhook for InferenceServices
//!
//! # Endpoints
//!
//! - `POST /validate-inferenceservices` - `admission.k8s.io/v1` AdmissionReview in,
//!   AdmissionReview with the decision out
//! - `GET /healthz` - liveness probe

use core::error::Error;
use std::sync::Arc;

use poem::Endpoint;
use poem::EndpointExt;
use poem::Route;
use poem::get;
use poem::middleware::Tracing;
use poem::post;

use crate::constants::VALIDATE_PATH;
use crate::validation::InferenceServiceValidator;

pub mod handlers;
pub mod server;

pub use server::TlsFiles;
pub use server::WebhookServer;

/// Webhook server errors
#[derive(Debug, derive_more::Display)]
pub enum WebhookError {
    #[display("Failed to read TLS material from {path}")]
    TlsMaterial { path: String },
    #[display("Server error: {message}")]
    ServerError { message: String },
}

impl Error for WebhookError {}

/// Routes served by the webhook, with the validator attached as shared data.
pub fn routes(validator: Arc<InferenceServiceValidator>) -> impl Endpoint {
    Route::new()
        .at(VALIDATE_PATH, post(handlers::validate_inference_service))
        .at("/healthz", get(handlers::healthz))
        .data(validator)
        .with(Tracing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_error_display_formatting() {
        let tls = WebhookError::TlsMaterial {
            path: "/etc/webhook/tls.crt".to_string(),
        };
        assert_eq!(
            tls.to_string(),
            "Failed to read TLS material from /etc/webhook/tls.crt"
        );

        let server = WebhookError::ServerError {
            message: "address in use".to_string(),
        };
        assert_eq!(server.to_string(), "Server error: address in use");
    }
}

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use error_stack::Report;
use error_stack::ResultExt;
use poem::Server;
use poem::listener::Listener;
use poem::listener::RustlsCertificate;
use poem::listener::RustlsConfig;
use poem::listener::TcpListener;
use tokio::sync::oneshot;
use tracing::error;
use tracing::info;

use super::WebhookError;
use super::routes;
use crate::validation::InferenceServiceValidator;

/// PEM files the webhook serves TLS with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// HTTP(S) server exposing the validating webhook
pub struct WebhookServer {
    validator: Arc<InferenceServiceValidator>,
    listen_addr: String,
    tls: Option<TlsFiles>,
}

impl WebhookServer {
    pub fn new(
        validator: Arc<InferenceServiceValidator>,
        listen_addr: String,
        tls: Option<TlsFiles>,
    ) -> Self {
        Self {
            validator,
            listen_addr,
            tls,
        }
    }

    /// Serve until the server fails or `shutdown_rx` fires.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::TlsMaterial`] if the certificate or key cannot be read
    /// - [`WebhookError::ServerError`] if the server fails to start or bind to the address
    pub async fn run(
        self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<(), Report<WebhookError>> {
        let app = routes(self.validator);

        let listener = TcpListener::bind(self.listen_addr.clone());
        let listener = match &self.tls {
            Some(tls) => {
                info!("Starting webhook server on https://{}", self.listen_addr);
                listener.rustls(load_tls_config(tls).await?).boxed()
            }
            None => {
                info!("Starting webhook server on http://{}", self.listen_addr);
                listener.boxed()
            }
        };
        let server = Server::new(listener);

        tokio::select! {
            result = server.run(app) => {
                match result {
                    Ok(()) => {
                        info!("Webhook server stopped normally");
                        Ok(())
                    }
                    Err(e) => {
                        error!("Webhook server failed: {e}");
                        Err(Report::new(WebhookError::ServerError {
                            message: format!("Server failed: {e}"),
                        }))
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("Webhook server shutdown requested");
                Ok(())
            }
        }
    }
}

async fn load_tls_config(tls: &TlsFiles) -> Result<RustlsConfig, Report<WebhookError>> {
    let cert = read_pem(&tls.cert).await?;
    let key = read_pem(&tls.key).await?;

    Ok(RustlsConfig::new().fallback(RustlsCertificate::new().cert(cert).key(key)))
}

async fn read_pem(path: &Path) -> Result<Vec<u8>, Report<WebhookError>> {
    tokio::fs::read(path)
        .await
        .change_context_lazy(|| WebhookError::TlsMaterial {
            path: path.display().to_string(),
        })
}

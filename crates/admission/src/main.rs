use std::path::Path;
use std::sync::Arc;

use admission::config::Cli;
use admission::config::Commands;
use admission::config::ServeArgs;
use admission::config::ValidateArgs;
use admission::config::ValidatorConfig;
use admission::validation::InferenceServiceValidator;
use admission::webhook::TlsFiles;
use admission::webhook::WebhookServer;
use anyhow::Context;
use anyhow::Result;
use api_types::InferenceService;
use clap::Parser;
use tokio::sync::oneshot;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    let _guard = utils::logging::init();

    match cli.command {
        Commands::Serve(serve_args) => run_serve(*serve_args).await,
        Commands::Validate(validate_args) => run_validate(validate_args).await,
    }
}

async fn load_validator(policy_config: Option<&Path>) -> Result<InferenceServiceValidator> {
    let config = ValidatorConfig::load_or_default(policy_config)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    Ok(InferenceServiceValidator::from_config(config))
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    tracing::info!("Starting isvc-admission webhook {}", &**version::VERSION);

    let validator = Arc::new(load_validator(args.policy_config.as_deref()).await?);
    let tls = args
        .tls_cert
        .zip(args.tls_key)
        .map(|(cert, key)| TlsFiles { cert, key });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
            return;
        }
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    });

    WebhookServer::new(validator, args.listen_addr, tls)
        .run(shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))
}

async fn run_validate(args: ValidateArgs) -> Result<()> {
    let validator = load_validator(args.policy_config.as_deref()).await?;

    let manifest = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("read manifest {}", args.file.display()))?;
    // YAML is a superset of JSON, so one parser covers both.
    let isvc: InferenceService = serde_yaml::from_str(&manifest)
        .with_context(|| format!("parse InferenceService from {}", args.file.display()))?;

    match validator.validate(args.operation.into(), None, &isvc) {
        Ok(warnings) => {
            for warning in &warnings {
                println!("warning: {warning}");
            }
            println!("InferenceService \"{}\" is valid", isvc.name());
            Ok(())
        }
        Err(report) => {
            eprintln!("InferenceService \"{}\" is invalid", isvc.name());
            Err(anyhow::anyhow!("{}", report.current_context()))
        }
    }
}

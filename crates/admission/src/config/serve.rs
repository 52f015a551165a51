use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;

use crate::validation::Operation;

#[derive(Parser, Clone, Debug)]
pub struct ServeArgs {
    #[arg(
        long,
        env = "ISVC_ADMISSION_LISTEN_ADDR",
        default_value = "0.0.0.0:9443",
        help = "Webhook server listen address"
    )]
    pub listen_addr: String,

    #[arg(
        long,
        env = "ISVC_ADMISSION_POLICY_CONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path for the validator policy, e.g. /etc/isvc-admission/policy.yaml"
    )]
    pub policy_config: Option<PathBuf>,

    #[arg(
        long,
        env = "ISVC_ADMISSION_TLS_CERT",
        requires = "tls_key",
        value_hint = clap::ValueHint::FilePath,
        help = "PEM certificate chain served to the API server; plain HTTP when unset"
    )]
    pub tls_cert: Option<PathBuf>,

    #[arg(
        long,
        env = "ISVC_ADMISSION_TLS_KEY",
        requires = "tls_cert",
        value_hint = clap::ValueHint::FilePath,
        help = "PEM private key matching --tls-cert"
    )]
    pub tls_key: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
pub struct ValidateArgs {
    #[arg(
        short,
        long,
        value_hint = clap::ValueHint::FilePath,
        help = "InferenceService manifest to validate (YAML or JSON)"
    )]
    pub file: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = OperationArg::Create,
        help = "Admission operation to validate the manifest for"
    )]
    pub operation: OperationArg,

    #[arg(
        long,
        env = "ISVC_ADMISSION_POLICY_CONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path for the validator policy"
    )]
    pub policy_config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationArg {
    Create,
    Update,
    Delete,
}

impl From<OperationArg> for Operation {
    fn from(arg: OperationArg) -> Self {
        match arg {
            OperationArg::Create => Operation::Create,
            OperationArg::Update => Operation::Update,
            OperationArg::Delete => Operation::Delete,
        }
    }
}

use clap::Parser;
use clap::Subcommand;
use utils::version;

use crate::config::serve::ServeArgs;
use crate::config::serve::ValidateArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the validating admission webhook
    Serve(Box<ServeArgs>),
    /// Validate an InferenceService manifest from a file and exit
    Validate(ValidateArgs),
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use meshmodel_import::client::{
    DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS, RegistryClient, RegistryConfig, SERVER_URL_ENV,
    TIMEOUT_ENV,
};
use meshmodel_import::import;
use meshmodel_import::sink::TerminalSink;
use meshmodel_import::{ImportError, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("meshmodel_import=warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| ImportError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Model(ModelCommand::Import(args)) => execute_import(args),
    }
}

fn execute_import(args: ImportArgs) -> Result<()> {
    let path = args.file.or(args.path).unwrap_or_default();
    let config =
        RegistryConfig::new(args.server).with_timeout(Duration::from_secs(args.timeout));
    let client = RegistryClient::new(config)?;
    let mut sink = TerminalSink::stdout();

    let response = import::import_model(&path, &client, &mut sink)?;
    info!(
        server = %client.config().base_url,
        models = %response.model_names_joined(),
        skipped_records = response.diagnostics.len(),
        "model import finished"
    );
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Register mesh models with a Meshery server."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Work with mesh models.
    #[command(subcommand)]
    Model(ModelCommand),
}

#[derive(Subcommand)]
enum ModelCommand {
    /// Import models from a file or a directory.
    #[command(after_help = "Examples:\n  \
        meshmodel-import model import -f /path/to/[file.yaml|file.json]\n  \
        meshmodel-import model import --file /path/to/models")]
    Import(ImportArgs),
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Path to the model file or directory.
    #[arg(value_name = "PATH", required_unless_present = "file", conflicts_with = "file")]
    path: Option<PathBuf>,

    /// Specify path to the file or directory.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: Option<PathBuf>,

    /// Base URL of the Meshery server.
    #[arg(long, env = SERVER_URL_ENV, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Request timeout in seconds.
    #[arg(long, env = TIMEOUT_ENV, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;

mod errors;
use commands::dataset_cmd::{DatasetsArgs, ShowArgs, SpecializeArgs};
use commands::registry_cmd::LocationsArgs;
use errors::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// martcfg: inspect mart dataset configurations and registries
#[derive(Parser)]
#[command(name = "martcfg")]
#[command(about = "Inspect mart dataset configurations and registries", long_about = None)]
struct Cli {
    /// Adaptor settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the dataset configs of a source
    Datasets(DatasetsArgs),

    /// Print one fully loaded dataset config
    Show(ShowArgs),

    /// Build the concrete config of a dynamic dataset from its template
    Specialize(SpecializeArgs),

    /// List the virtual schemas and locations of a registry
    Locations(LocationsArgs),

    /// Show the CLI version
    Version,
}

async fn run(cli: &Cli) -> Result<String, Error> {
    let settings = || config::load_settings(cli.config.as_deref());

    match &cli.command {
        Commands::Datasets(args) => commands::dataset_cmd::list_datasets(args, settings()?).await,
        Commands::Show(args) => commands::dataset_cmd::show_dataset(args, settings()?).await,
        Commands::Specialize(args) => {
            commands::dataset_cmd::specialize_dataset(args, settings()?).await
        }
        Commands::Locations(args) => commands::registry_cmd::list_locations(args),
        Commands::Version => Ok(format!(
            "martcfg version {}",
            option_env!("MART_CONFIG_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
        )),
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output can be piped
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("MART_CONFIG_LOG"))
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(output) => {
            println!("{output}");
        }
        Err(e) => {
            error!("Error: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

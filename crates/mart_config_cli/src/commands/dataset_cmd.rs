//! Dataset config commands for the martcfg CLI.
//!
//! # Examples
//!
//! ```bash
//! # List every dataset config under a directory
//! martcfg datasets --source ./marts
//!
//! # Print one fully loaded config as JSON
//! martcfg show --source ./marts --dataset snp --internal-name snp_config --format json
//!
//! # Specialize a template for one of its dynamic datasets
//! martcfg specialize --source ./marts --dataset gene --internal-name gene_template \
//!     --target hsapiens_gene
//! ```

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use colored::Colorize;
use mart_config::{
    render_dataset_config, AdaptorSettings, DatasetConfig, DsConfigAdaptor, FilesystemAdaptor,
    TemplateResolver,
};
use tracing::{debug, instrument};

use crate::errors::Error;

#[cfg(test)]
#[path = "dataset_cmd_tests.rs"]
mod tests;

/// Output formats for a single dataset config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Toml,
    Json,
}

/// Arguments of `martcfg datasets`.
#[derive(Args, Debug, Clone)]
pub struct DatasetsArgs {
    /// Dataset config document or directory of documents.
    #[arg(long)]
    pub source: PathBuf,
}

/// Arguments of `martcfg show`.
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Dataset config document or directory of documents.
    #[arg(long)]
    pub source: PathBuf,

    /// Dataset name.
    #[arg(long)]
    pub dataset: String,

    /// Internal name of the config within the dataset.
    #[arg(long)]
    pub internal_name: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
    pub format: OutputFormat,
}

/// Arguments of `martcfg specialize`.
#[derive(Args, Debug, Clone)]
pub struct SpecializeArgs {
    /// Dataset config document or directory of documents.
    #[arg(long)]
    pub source: PathBuf,

    /// Dataset name of the template.
    #[arg(long)]
    pub dataset: String,

    /// Internal name of the template config.
    #[arg(long)]
    pub internal_name: String,

    /// Dynamic dataset to build.
    #[arg(long)]
    pub target: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Toml)]
    pub format: OutputFormat,
}

/// One line per config: dataset, internal name and display name.
#[instrument(skip(settings), fields(source = %args.source.display()))]
pub async fn list_datasets(
    args: &DatasetsArgs,
    settings: AdaptorSettings,
) -> Result<String, Error> {
    let adaptor = FilesystemAdaptor::new(args.source.clone(), settings)?;

    let mut configs = adaptor.dataset_configs().await?;
    configs.sort_by(|a, b| a.dataset().cmp(b.dataset()).then(a.display_order(b)));
    debug!("Listing {} dataset configs", configs.len());

    let lines: Vec<String> = configs
        .iter()
        .map(|config| {
            format!(
                "{}\t{}\t{}",
                config.dataset().bold(),
                config.internal_name(),
                config.display_name().unwrap_or_default()
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

/// The fully loaded config, rendered in the requested format.
#[instrument(skip(settings), fields(source = %args.source.display()))]
pub async fn show_dataset(args: &ShowArgs, settings: AdaptorSettings) -> Result<String, Error> {
    let adaptor = FilesystemAdaptor::new(args.source.clone(), settings)?;
    let config = find_config(&adaptor, &args.dataset, &args.internal_name).await?;

    render(&config, args.format)
}

/// The concrete config built from a template for one dynamic dataset.
#[instrument(skip(settings), fields(source = %args.source.display()))]
pub async fn specialize_dataset(
    args: &SpecializeArgs,
    settings: AdaptorSettings,
) -> Result<String, Error> {
    if args.target.trim().is_empty() {
        return Err(Error::InvalidArguments(
            "--target must name a dynamic dataset".to_string(),
        ));
    }

    let adaptor = FilesystemAdaptor::new(args.source.clone(), settings)?;
    let template = find_config(&adaptor, &args.dataset, &args.internal_name).await?;
    let concrete = TemplateResolver::new().specialize(&template, &args.target)?;

    render(&concrete, args.format)
}

async fn find_config(
    adaptor: &FilesystemAdaptor,
    dataset: &str,
    internal_name: &str,
) -> Result<DatasetConfig, Error> {
    adaptor
        .dataset_config_by_internal_name(dataset, internal_name)
        .await?
        .ok_or_else(|| Error::DatasetConfigNotFound {
            dataset: dataset.to_string(),
            internal_name: internal_name.to_string(),
        })
}

fn render(config: &DatasetConfig, format: OutputFormat) -> Result<String, Error> {
    let document = render_dataset_config(config)?;
    match format {
        OutputFormat::Toml => Ok(document),
        OutputFormat::Json => {
            let value: toml::Table =
                toml::from_str(&document).map_err(|e| Error::Render(e.to_string()))?;
            serde_json::to_string_pretty(&value).map_err(|e| Error::Render(e.to_string()))
        }
    }
}

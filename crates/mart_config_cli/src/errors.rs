use mart_config::ConfigurationError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the martcfg CLI application.
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration library reported a failure.
    ///
    /// This error is returned when a source, registry or settings file
    /// cannot be read or parsed, or when the library rejects an operation,
    /// for example specializing a dataset the template does not declare.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Invalid command-line arguments were provided.
    ///
    /// This error is returned when an argument passes parsing but cannot be
    /// used, such as a blank `--target` for `martcfg specialize`.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// No dataset config matched the requested names.
    ///
    /// This error is returned when the source was read successfully but
    /// holds no config with the requested dataset and internal name.
    #[error("No dataset config '{internal_name}' for dataset '{dataset}'")]
    DatasetConfigNotFound {
        dataset: String,
        internal_name: String,
    },

    /// A config could not be rendered in the requested output format.
    ///
    /// This error is returned when the serialized document cannot be
    /// converted to the format selected with `--format`.
    #[error("Failed to render output: {0}")]
    Render(String),
}

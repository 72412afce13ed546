//! Settings handling for the martcfg CLI.
//!
//! Every command accepts `--config <path>` pointing at an adaptor settings
//! TOML file. Without it the library defaults apply.

use std::path::Path;

use mart_config::AdaptorSettings;
use tracing::{debug, info};

use crate::errors::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Load adaptor settings from `path`, or the defaults when no path is given.
///
/// # Errors
///
/// Returns `Error::Configuration` when the file is missing, unreadable or
/// not valid settings TOML.
pub fn load_settings(path: Option<&Path>) -> Result<AdaptorSettings, Error> {
    match path {
        Some(path) => {
            let settings = AdaptorSettings::load(path)?;
            info!("Loaded adaptor settings from {:?}", path);
            Ok(settings)
        }
        None => {
            debug!("No settings file given, using defaults");
            Ok(AdaptorSettings::default())
        }
    }
}

//! Registry inspection commands for the martcfg CLI.
//!
//! ```bash
//! martcfg locations --registry ./registry.toml
//! ```

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use mart_config::{MartLocation, MartRegistry, VirtualSchema};
use tracing::{debug, instrument};

use crate::errors::Error;

#[cfg(test)]
#[path = "registry_cmd_tests.rs"]
mod tests;

/// Arguments of `martcfg locations`.
#[derive(Args, Debug, Clone)]
pub struct LocationsArgs {
    /// Mart registry document.
    #[arg(long)]
    pub registry: PathBuf,
}

/// Every virtual schema of the registry followed by its locations.
#[instrument(fields(registry = %args.registry.display()))]
pub fn list_locations(args: &LocationsArgs) -> Result<String, Error> {
    let registry = MartRegistry::load(&args.registry)?;
    debug!(
        "Loaded registry {} with {} virtual schemas",
        registry.name(),
        registry.virtual_schemas().len()
    );

    let mut lines = vec![format!("{}", registry.name().bold())];
    for schema in registry.virtual_schemas() {
        lines.push(schema_line(schema));
        lines.extend(schema.locations().iter().map(location_line));
    }
    Ok(lines.join("\n"))
}

fn schema_line(schema: &VirtualSchema) -> String {
    let mut line = format!("  {}", schema.name().cyan());
    if !schema.is_visible() {
        line.push_str(" (hidden)");
    }
    line
}

fn location_line(location: &MartLocation) -> String {
    let target = match location {
        MartLocation::Database(db) => format!(
            "{}@{}/{}/{}",
            db.user(),
            db.host(),
            db.instance_name(),
            db.schema()
        ),
        MartLocation::Url(url) => url.url().to_string(),
    };

    let mut line = format!("    [{}] {} {}", location.kind(), location.name(), target);
    if !location.is_visible() {
        line.push_str(" (hidden)");
    }
    line
}

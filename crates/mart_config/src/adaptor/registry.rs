//! Registry-backed composites: one child composite per virtual schema,
//! one leaf per location.

use super::{CompositeAdaptor, DatabaseAdaptor, DatasetConfigStore, DsConfigAdaptor, FilesystemAdaptor};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::{ConnectionProbe, MartLocation};
use crate::registry::MartRegistry;
use crate::settings::AdaptorSettings;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// Creates the adaptor that serves a location.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait LocationAdaptorFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnsupportedLocation` for locations the
    /// factory cannot serve, or the adaptor's own construction error.
    async fn create(&self, location: &MartLocation) -> ConfigurationResult<Arc<dyn DsConfigAdaptor>>;
}

/// Collaborators needed to serve database locations.
#[derive(Clone)]
pub struct DatabaseBackend {
    pub store: Arc<dyn DatasetConfigStore>,
    pub probe: Arc<dyn ConnectionProbe>,
}

/// Serves `file://` URL locations with a [`FilesystemAdaptor`] and, when a
/// [`DatabaseBackend`] is configured, database locations with a
/// [`DatabaseAdaptor`].
#[derive(Clone)]
pub struct StandardLocationFactory {
    settings: AdaptorSettings,
    database: Option<DatabaseBackend>,
}

impl StandardLocationFactory {
    pub fn new(settings: AdaptorSettings) -> Self {
        Self {
            settings,
            database: None,
        }
    }

    pub fn with_database(mut self, backend: DatabaseBackend) -> Self {
        self.database = Some(backend);
        self
    }
}

#[async_trait]
impl LocationAdaptorFactory for StandardLocationFactory {
    async fn create(&self, location: &MartLocation) -> ConfigurationResult<Arc<dyn DsConfigAdaptor>> {
        match location {
            MartLocation::Url(url_location) => {
                let url = url_location.url();
                if url.scheme() != "file" {
                    return Err(ConfigurationError::UnsupportedLocation {
                        location: location.name(),
                        reason: format!("'{}' URLs are not served", url.scheme()),
                    });
                }

                let path = url.to_file_path().map_err(|_| {
                    ConfigurationError::UnsupportedLocation {
                        location: location.name(),
                        reason: format!("'{}' is not a local path", url),
                    }
                })?;

                let adaptor = FilesystemAdaptor::new(path, self.settings.clone())?
                    .with_name(url_location.name());
                Ok(Arc::new(adaptor))
            }
            MartLocation::Database(db_location) => {
                let backend =
                    self.database
                        .as_ref()
                        .ok_or_else(|| ConfigurationError::UnsupportedLocation {
                            location: location.name(),
                            reason: "no database backend configured".to_string(),
                        })?;

                let adaptor = DatabaseAdaptor::connect(
                    db_location.clone(),
                    Arc::clone(&backend.store),
                    backend.probe.as_ref(),
                    self.settings.clone(),
                )
                .await?;
                Ok(Arc::new(adaptor))
            }
        }
    }
}

impl CompositeAdaptor {
    /// Build a composite for a registry.
    ///
    /// The root is named after the registry and holds one composite per
    /// virtual schema, each holding one adaptor per location in schema
    /// order.
    ///
    /// # Errors
    ///
    /// The first error from `factory`, or a duplicate location name
    /// within a schema.
    #[instrument(skip_all, fields(registry = %registry.name()))]
    pub async fn from_registry(
        registry: &MartRegistry,
        factory: &dyn LocationAdaptorFactory,
    ) -> ConfigurationResult<Self> {
        let mut root = CompositeAdaptor::new(registry.name());

        for schema in registry.virtual_schemas() {
            let mut schema_adaptor = CompositeAdaptor::new(schema.name());
            for location in schema.locations() {
                schema_adaptor.add_adaptor(factory.create(location).await?)?;
            }
            root.add_adaptor(Arc::new(schema_adaptor))?;
        }

        info!(
            "Built adaptor tree with {} virtual schemas and {} leaves",
            root.child_adaptors().len(),
            root.leaf_adaptors().len()
        );
        Ok(root)
    }
}

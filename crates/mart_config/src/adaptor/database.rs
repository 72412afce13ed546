//! Leaf adaptor over a database-backed configuration store.

use super::cache::{CacheStatistics, ConfigCache, ConfigKey};
use super::{check_owner, AdaptorId, DsConfigAdaptor};
use crate::dataset_config::DatasetConfig;
use crate::entity::Entity;
use crate::errors::ConfigurationResult;
use crate::location::{ConnectionParameters, ConnectionProbe, MartLocation, RegistryDbLocation};
use crate::settings::AdaptorSettings;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[cfg(test)]
#[path = "database_tests.rs"]
mod tests;

/// Reads dataset configs stored in a mart database.
///
/// Implemented by the storage collaborator that owns the SQL. Must be
/// thread-safe (`Send + Sync`).
#[async_trait]
pub trait DatasetConfigStore: Send + Sync {
    /// Dataset-level attributes of every stored config.
    ///
    /// Deep structure may be omitted; it is fetched by
    /// [`load_dataset_config`](Self::load_dataset_config).
    async fn list_dataset_configs(
        &self,
        connection: &ConnectionParameters,
    ) -> ConfigurationResult<Vec<DatasetConfig>>;

    /// The complete config for a dataset and internal name.
    async fn load_dataset_config(
        &self,
        connection: &ConnectionParameters,
        dataset: &str,
        internal_name: &str,
    ) -> ConfigurationResult<DatasetConfig>;
}

/// Leaf adaptor backed by one database location.
///
/// The location is resolved, and its connection validated, when the
/// adaptor is created. Listings are cached until `update` or
/// `clear_cache`; each config's full structure is fetched at most once
/// between refreshes.
///
/// # Examples
///
/// ```no_run
/// use mart_config::{
///     AdaptorSettings, ConnectionProbe, DatabaseAdaptor, DatasetConfigStore, DsConfigAdaptor,
///     RegistryDbLocation,
/// };
/// use std::sync::Arc;
///
/// # async fn example(
/// #     location: RegistryDbLocation,
/// #     store: Arc<dyn DatasetConfigStore>,
/// #     probe: &dyn ConnectionProbe,
/// # ) -> mart_config::ConfigurationResult<()> {
/// let adaptor = DatabaseAdaptor::connect(location, store, probe, AdaptorSettings::default()).await?;
/// for config in adaptor.dataset_configs().await? {
///     println!("{}/{}", config.dataset(), config.internal_name());
/// }
/// # Ok(())
/// # }
/// ```
pub struct DatabaseAdaptor {
    id: AdaptorId,
    name: String,
    display_name: String,
    location: RegistryDbLocation,
    connection: ConnectionParameters,
    store: Arc<dyn DatasetConfigStore>,
    settings: AdaptorSettings,
    cache: ConfigCache<()>,
}

impl std::fmt::Debug for DatabaseAdaptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseAdaptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("connection", &self.connection.connection_string)
            .field("store", &"Arc<dyn DatasetConfigStore>")
            .field("cache", &self.cache)
            .finish()
    }
}

impl DatabaseAdaptor {
    /// Resolve `location` and create an adaptor over `store`.
    ///
    /// Nothing is listed yet; the store is first queried by the first
    /// listing or lookup.
    ///
    /// # Arguments
    ///
    /// * `location` - Database location to read from
    /// * `store` - Storage collaborator that runs the queries
    /// * `probe` - Used once to validate the resolved connection
    /// * `settings` - Connection defaults and hidden-element handling
    ///
    /// # Returns
    ///
    /// An adaptor named after the location and labelled with the resolved
    /// connection's display name.
    ///
    /// # Errors
    ///
    /// Connection-parameter and validation errors from
    /// [`RegistryDbLocation::resolve`].
    #[instrument(skip_all, fields(location = %location.name()))]
    pub async fn connect(
        location: RegistryDbLocation,
        store: Arc<dyn DatasetConfigStore>,
        probe: &dyn ConnectionProbe,
        settings: AdaptorSettings,
    ) -> ConfigurationResult<Self> {
        let connection = location.resolve(probe, &settings.connection).await?;
        info!("Database adaptor connected to {}", connection.display_name);

        Ok(Self {
            id: AdaptorId::new(),
            name: location.name(),
            display_name: connection.display_name.clone(),
            location,
            connection,
            store,
            settings,
            cache: ConfigCache::new(),
        })
    }

    /// Rename the adaptor, keeping its instance identity.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn location(&self) -> &RegistryDbLocation {
        &self.location
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    async fn cached_configs(&self) -> ConfigurationResult<Vec<DatasetConfig>> {
        if let Some(configs) = self.cache.configs() {
            return Ok(configs);
        }

        self.update().await?;
        Ok(self.cache.configs().unwrap_or_default())
    }

    async fn find(
        &self,
        matches: impl Fn(&DatasetConfig) -> bool + Send,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        let found = self.cached_configs().await?.into_iter().find(|c| matches(c));
        match found {
            Some(config) => self.lazy_load(config).await.map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DsConfigAdaptor for DatabaseAdaptor {
    fn id(&self) -> AdaptorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn dataset_configs(&self) -> ConfigurationResult<Vec<DatasetConfig>> {
        self.cached_configs().await
    }

    async fn dataset_config_by_internal_name(
        &self,
        dataset: &str,
        internal_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        self.find(|c| c.matches_internal_name(dataset, internal_name))
            .await
    }

    async fn dataset_config_by_display_name(
        &self,
        dataset: &str,
        display_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        self.find(|c| c.matches_display_name(dataset, display_name))
            .await
    }

    /// Fill in a shallow config with the structure held by the store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ForeignDatasetConfig` when `config` was
    /// listed by another adaptor instance, or the store's error when the
    /// fetch fails. A failed fetch is not cached.
    #[instrument(skip(self, config), fields(adaptor = %self.name, dataset = %config.dataset()))]
    async fn lazy_load(&self, config: DatasetConfig) -> ConfigurationResult<DatasetConfig> {
        if config.is_loaded() {
            return Ok(config);
        }
        check_owner(self.id, &self.name, &config)?;

        let include_hidden = self.settings.include_hidden;
        let full = self
            .cache
            .load_once(ConfigKey::of(&config), || async {
                debug!(
                    "Fetching {}/{} from {}",
                    config.dataset(),
                    config.internal_name(),
                    self.connection.display_name
                );
                let full = self
                    .store
                    .load_dataset_config(&self.connection, config.dataset(), config.internal_name())
                    .await?;
                Ok(if include_hidden {
                    full
                } else {
                    full.without_hidden()
                })
            })
            .await?;

        Ok(config.populate_from(full))
    }

    async fn mart_locations(&self) -> ConfigurationResult<Vec<MartLocation>> {
        Ok(vec![MartLocation::Database(self.location.clone())])
    }

    /// Re-list configs from the store; on failure the previous listing is
    /// kept.
    #[instrument(skip(self), fields(adaptor = %self.name))]
    async fn update(&self) -> ConfigurationResult<()> {
        match self.store.list_dataset_configs(&self.connection).await {
            Ok(configs) => {
                let entries: Vec<(DatasetConfig, ())> = configs
                    .into_iter()
                    .filter(|c| self.settings.include_hidden || !c.is_hidden())
                    .map(|c| (c.with_owner(self.id, self.name.clone()).shallow_copy(), ()))
                    .collect();
                info!("Listed {} dataset configs", entries.len());
                self.cache.replace(entries);
                Ok(())
            }
            Err(e) => {
                warn!("Listing failed, keeping cached configs: {}", e);
                Err(e)
            }
        }
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }

    fn data_source(&self) -> Option<ConnectionParameters> {
        Some(self.connection.clone())
    }
}

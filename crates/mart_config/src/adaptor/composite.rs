//! Composite adaptor aggregating named children.

use super::{AdaptorId, DsConfigAdaptor};
use crate::adaptor::cache::ConfigKey;
use crate::dataset_config::DatasetConfig;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::MartLocation;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[cfg(test)]
#[path = "composite_tests.rs"]
mod tests;

/// Aggregates child adaptors in registration order.
///
/// Listings fan out to every child. When two children provide a config
/// with the same dataset and internal name, the child registered first
/// wins, for listings and lookups alike.
///
/// Child names only need to be unique among direct children. Shallow
/// configs are routed back to the leaf that listed them by instance
/// identity, so leaves in different branches may share a name.
///
/// # Examples
///
/// ```
/// use mart_config::{CompositeAdaptor, DatasetConfig, DatasetConfigAdaptor};
/// use std::sync::Arc;
///
/// let snp = DatasetConfigAdaptor::new(DatasetConfig::new("snp", "default", "")?);
/// let gene = DatasetConfigAdaptor::new(DatasetConfig::new("gene", "default", "")?);
///
/// let composite = CompositeAdaptor::new("ensembl")
///     .with_adaptor(Arc::new(snp))?
///     .with_adaptor(Arc::new(gene))?;
/// assert_eq!(composite.leaf_adaptors().len(), 2);
/// # Ok::<(), mart_config::ConfigurationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CompositeAdaptor {
    id: AdaptorId,
    name: String,
    display_name: String,
    children: Vec<Arc<dyn DsConfigAdaptor>>,
}

impl CompositeAdaptor {
    /// Create an empty composite labelled with its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: AdaptorId::new(),
            display_name: name.clone(),
            name,
            children: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Register a child after the existing ones.
    ///
    /// The child is consulted after every child registered before it, so
    /// its configs lose to theirs on a dataset and internal name collision.
    ///
    /// # Arguments
    ///
    /// * `adaptor` - Leaf or composite to register
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidConfiguration` when a direct
    /// child already has the same name.
    pub fn add_adaptor(&mut self, adaptor: Arc<dyn DsConfigAdaptor>) -> ConfigurationResult<()> {
        if self.children.iter().any(|c| c.name() == adaptor.name()) {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "adaptor".to_string(),
                reason: format!(
                    "Adaptor '{}' already contains a child named '{}'",
                    self.name,
                    adaptor.name()
                ),
            });
        }

        debug!("Adding adaptor '{}' to '{}'", adaptor.name(), self.name);
        self.children.push(adaptor);
        Ok(())
    }

    /// Builder form of [`add_adaptor`](Self::add_adaptor).
    pub fn with_adaptor(mut self, adaptor: Arc<dyn DsConfigAdaptor>) -> ConfigurationResult<Self> {
        self.add_adaptor(adaptor)?;
        Ok(self)
    }

    /// Unregister and return a direct child.
    ///
    /// # Returns
    ///
    /// The removed child, or `None` when no direct child has that name.
    pub fn remove_adaptor(&mut self, name: &str) -> Option<Arc<dyn DsConfigAdaptor>> {
        let index = self.children.iter().position(|c| c.name() == name)?;
        Some(self.children.remove(index))
    }

    /// Leaves below this composite, depth first.
    pub fn leaf_adaptors(&self) -> Vec<Arc<dyn DsConfigAdaptor>> {
        self.children.iter().flat_map(super::leaf_adaptors).collect()
    }

    /// Find the leaf with instance identity `id` anywhere below this
    /// composite.
    fn find_leaf(&self, id: AdaptorId) -> Option<Arc<dyn DsConfigAdaptor>> {
        fn search(
            children: &[Arc<dyn DsConfigAdaptor>],
            id: AdaptorId,
        ) -> Option<Arc<dyn DsConfigAdaptor>> {
            for child in children {
                if child.is_composite() {
                    if let Some(found) = search(&child.child_adaptors(), id) {
                        return Some(found);
                    }
                } else if child.id() == id {
                    return Some(Arc::clone(child));
                }
            }
            None
        }

        search(&self.children, id)
    }
}

#[async_trait]
impl DsConfigAdaptor for CompositeAdaptor {
    fn id(&self) -> AdaptorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn is_composite(&self) -> bool {
        true
    }

    fn child_adaptors(&self) -> Vec<Arc<dyn DsConfigAdaptor>> {
        self.children.clone()
    }

    async fn dataset_configs(&self) -> ConfigurationResult<Vec<DatasetConfig>> {
        let mut seen = HashSet::new();
        let mut configs = Vec::new();

        for child in &self.children {
            for config in child.dataset_configs().await? {
                if seen.insert(ConfigKey::of(&config)) {
                    configs.push(config);
                } else {
                    debug!(
                        "Ignoring {}/{} from '{}': provided by an earlier adaptor",
                        config.dataset(),
                        config.internal_name(),
                        child.name()
                    );
                }
            }
        }

        Ok(configs)
    }

    async fn supports_dataset(&self, dataset: &str) -> ConfigurationResult<bool> {
        for child in &self.children {
            if child.supports_dataset(dataset).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn dataset_config_by_internal_name(
        &self,
        dataset: &str,
        internal_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        for child in &self.children {
            if let Some(config) = child
                .dataset_config_by_internal_name(dataset, internal_name)
                .await?
            {
                return Ok(Some(config));
            }
        }
        Ok(None)
    }

    async fn dataset_config_by_display_name(
        &self,
        dataset: &str,
        display_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        for child in &self.children {
            if let Some(config) = child
                .dataset_config_by_display_name(dataset, display_name)
                .await?
            {
                return Ok(Some(config));
            }
        }
        Ok(None)
    }

    /// Delegate to the leaf below this composite that listed `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::ForeignDatasetConfig` when no leaf below
    /// this composite owns `config`, and otherwise whatever the owning
    /// leaf returns.
    async fn lazy_load(&self, config: DatasetConfig) -> ConfigurationResult<DatasetConfig> {
        if config.is_loaded() {
            return Ok(config);
        }

        let owner = config.owner_id().and_then(|id| self.find_leaf(id));
        match owner {
            Some(owner) => owner.lazy_load(config).await,
            None => Err(ConfigurationError::ForeignDatasetConfig {
                adaptor: self.name.clone(),
                owner: config.adaptor().unwrap_or("none").to_string(),
                dataset: format!("{}/{}", config.dataset(), config.internal_name()),
            }),
        }
    }

    /// Locations of every child, in registration order.
    async fn mart_locations(&self) -> ConfigurationResult<Vec<MartLocation>> {
        let mut locations = Vec::new();
        for child in &self.children {
            locations.extend(child.mart_locations().await?);
        }
        Ok(locations)
    }

    /// Update every child; the first failure is returned after all
    /// children have been tried.
    #[instrument(skip(self), fields(adaptor = %self.name))]
    async fn update(&self) -> ConfigurationResult<()> {
        let mut first_error = None;

        for child in &self.children {
            if let Err(e) = child.update().await {
                warn!("Update of '{}' failed: {}", child.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn clear_cache(&self) {
        for child in &self.children {
            child.clear_cache();
        }
    }
}

//! Dataset configuration adaptors.
//!
//! An adaptor is a uniform source of [`DatasetConfig`]s. Leaves read from
//! one concrete source; composites aggregate named child adaptors.
//!
//! # Architecture
//!
//! ```text
//! CompositeAdaptor (one per registry / virtual schema)
//!     ↓ owns, in registration order
//! DsConfigAdaptor trait
//!     ↑ implemented by
//! DatasetConfigAdaptor | FilesystemAdaptor | DatabaseAdaptor
//!                                              ↓ depends on
//!                                        DatasetConfigStore trait
//! ```
//!
//! Listings return the adaptor's configs in the `Unloaded` state, owned by
//! the adaptor that produced them. Ownership is recorded by [`AdaptorId`],
//! so leaves with equal names in different branches stay distinct. Lookups
//! by name return `Loaded` copies.

use crate::dataset_config::DatasetConfig;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::{ConnectionParameters, MartLocation};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

mod cache;
mod composite;
mod database;
mod dataset_config_adaptor;
mod filesystem;
mod registry;

pub use cache::CacheStatistics;
pub use composite::CompositeAdaptor;
pub use database::{DatabaseAdaptor, DatasetConfigStore};
pub use dataset_config_adaptor::DatasetConfigAdaptor;
pub use filesystem::FilesystemAdaptor;
pub use registry::{DatabaseBackend, LocationAdaptorFactory, StandardLocationFactory};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

/// Identity of one adaptor instance.
///
/// Adaptor names are only unique among the direct children of one
/// composite, so ownership of a [`DatasetConfig`] is recorded with this
/// identity instead. Every adaptor draws a fresh identity when it is
/// constructed; clones of an adaptor share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdaptorId(Uuid);

impl AdaptorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AdaptorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AdaptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A uniform source of dataset configurations.
///
/// Lookups that find nothing return `Ok(None)` or an empty list; errors are
/// reserved for failures of the backing source.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait DsConfigAdaptor: Send + Sync + std::fmt::Debug {
    /// Instance identity recorded on the configs this adaptor owns.
    fn id(&self) -> AdaptorId;

    /// Name of the adaptor, unique among the children of its parent.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// `true` for adaptors that aggregate children, even when they
    /// currently have none.
    fn is_composite(&self) -> bool {
        false
    }

    /// Direct children, in registration order.
    fn child_adaptors(&self) -> Vec<Arc<dyn DsConfigAdaptor>> {
        Vec::new()
    }

    /// Names of the direct children.
    fn adaptor_names(&self) -> Vec<String> {
        self.child_adaptors()
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    /// Direct child with the given name.
    fn adaptor_by_name(&self, name: &str) -> Option<Arc<dyn DsConfigAdaptor>> {
        self.child_adaptors().into_iter().find(|a| a.name() == name)
    }

    fn supports_adaptor(&self, name: &str) -> bool {
        self.adaptor_by_name(name).is_some()
    }

    /// Every config this adaptor provides. Each call builds a fresh list.
    async fn dataset_configs(&self) -> ConfigurationResult<Vec<DatasetConfig>>;

    async fn dataset_configs_by_dataset(
        &self,
        dataset: &str,
    ) -> ConfigurationResult<Vec<DatasetConfig>> {
        Ok(self
            .dataset_configs()
            .await?
            .into_iter()
            .filter(|c| c.dataset() == dataset)
            .collect())
    }

    /// Distinct dataset names in listing order.
    async fn dataset_names(&self) -> ConfigurationResult<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for config in self.dataset_configs().await? {
            if !names.iter().any(|n| n == config.dataset()) {
                names.push(config.dataset().to_string());
            }
        }
        Ok(names)
    }

    async fn supports_dataset(&self, dataset: &str) -> ConfigurationResult<bool> {
        Ok(self
            .dataset_configs()
            .await?
            .iter()
            .any(|c| c.dataset() == dataset))
    }

    /// Loaded copy of the config matching both dataset and internal name.
    async fn dataset_config_by_internal_name(
        &self,
        dataset: &str,
        internal_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>>;

    /// Loaded copy of the config matching both dataset and display name.
    async fn dataset_config_by_display_name(
        &self,
        dataset: &str,
        display_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>>;

    /// Complete an `Unloaded` config owned by this adaptor.
    ///
    /// Loaded configs are returned unchanged.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::ForeignDatasetConfig` - another adaptor owns the config
    /// * backing-source errors from reading the full config
    async fn lazy_load(&self, config: DatasetConfig) -> ConfigurationResult<DatasetConfig>;

    /// Locations backing this adaptor, for registry assembly.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::NoLocationBacking` when the adaptor has
    /// no source a location can describe.
    async fn mart_locations(&self) -> ConfigurationResult<Vec<MartLocation>>;

    /// Re-read cached lists from the backing source.
    ///
    /// On failure the previous cache is kept and the error returned.
    async fn update(&self) -> ConfigurationResult<()>;

    /// Drop cached lists. Never fails.
    fn clear_cache(&self);

    /// Connection parameters of a directly database-backed adaptor.
    fn data_source(&self) -> Option<ConnectionParameters> {
        None
    }
}

/// Every leaf below `adaptor`, depth first in registration order.
///
/// A non-composite adaptor is its own single leaf; composites, including
/// empty ones, never appear in the result.
///
/// # Examples
///
/// ```
/// use mart_config::{leaf_adaptors, CompositeAdaptor, DatasetConfig, DatasetConfigAdaptor, DsConfigAdaptor};
/// use std::sync::Arc;
///
/// let leaf = DatasetConfigAdaptor::new(DatasetConfig::new("snp", "snp_config", "")?);
/// let inner = CompositeAdaptor::new("inner").with_adaptor(Arc::new(leaf))?;
/// let root: Arc<dyn DsConfigAdaptor> =
///     Arc::new(CompositeAdaptor::new("root").with_adaptor(Arc::new(inner))?);
///
/// let leaves = leaf_adaptors(&root);
/// assert_eq!(leaves.len(), 1);
/// assert!(leaves[0].child_adaptors().is_empty());
/// # Ok::<(), mart_config::ConfigurationError>(())
/// ```
pub fn leaf_adaptors(adaptor: &Arc<dyn DsConfigAdaptor>) -> Vec<Arc<dyn DsConfigAdaptor>> {
    if !adaptor.is_composite() {
        return vec![Arc::clone(adaptor)];
    }

    adaptor
        .child_adaptors()
        .iter()
        .flat_map(leaf_adaptors)
        .collect()
}

/// Fail unless the adaptor identified by `id` owns `config`.
///
/// `name` is only used to describe the failure.
fn check_owner(id: AdaptorId, name: &str, config: &DatasetConfig) -> ConfigurationResult<()> {
    if config.is_owned_by(id) {
        return Ok(());
    }

    Err(ConfigurationError::ForeignDatasetConfig {
        adaptor: name.to_string(),
        owner: config.adaptor().unwrap_or("none").to_string(),
        dataset: format!("{}/{}", config.dataset(), config.internal_name()),
    })
}

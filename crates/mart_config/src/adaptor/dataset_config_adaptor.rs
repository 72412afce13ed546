//! Leaf adaptor over one in-memory dataset config.

use super::{check_owner, AdaptorId, DsConfigAdaptor};
use crate::dataset_config::DatasetConfig;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::MartLocation;
use async_trait::async_trait;

#[cfg(test)]
#[path = "dataset_config_adaptor_tests.rs"]
mod tests;

/// Wraps exactly one dataset config.
///
/// The wrapped config is assumed complete, so `update` and `lazy_load`
/// have nothing to do. Callers only ever receive copies. There is no
/// location to export.
///
/// Two adaptors are equal when they carry the same name, label and
/// wrapped config; instance identity is not compared.
#[derive(Debug, Clone)]
pub struct DatasetConfigAdaptor {
    id: AdaptorId,
    name: String,
    display_name: String,
    config: DatasetConfig,
}

impl DatasetConfigAdaptor {
    /// Wrap `config` in a new leaf.
    ///
    /// The adaptor is named `<dataset>.<internal name>`, since most marts
    /// reuse the same internal name (typically `default`) across datasets.
    /// It is labelled with the config's display name when it has one, and
    /// with its name otherwise. The wrapped config is marked `Loaded` and
    /// owned by the new adaptor.
    ///
    /// # Examples
    ///
    /// ```
    /// use mart_config::{DatasetConfig, DatasetConfigAdaptor, DsConfigAdaptor};
    ///
    /// let config = DatasetConfig::new("snp", "default", "Variation")?;
    /// let adaptor = DatasetConfigAdaptor::new(config);
    ///
    /// assert_eq!(adaptor.name(), "snp.default");
    /// assert_eq!(adaptor.display_name(), "Variation");
    /// # Ok::<(), mart_config::ConfigurationError>(())
    /// ```
    pub fn new(config: DatasetConfig) -> Self {
        let id = AdaptorId::new();
        let name = format!("{}.{}", config.dataset(), config.internal_name());
        let display_name = config.display_name().unwrap_or(&name).to_string();
        let config = config.into_loaded().with_owner(id, name.clone());

        Self {
            id,
            name,
            display_name,
            config,
        }
    }

    /// Rename the adaptor; the wrapped config follows.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.config.set_owner(self.id, self.name.clone());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }
}

impl PartialEq for DatasetConfigAdaptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.display_name == other.display_name
            && self.config == other.config
    }
}

impl Eq for DatasetConfigAdaptor {}

#[async_trait]
impl DsConfigAdaptor for DatasetConfigAdaptor {
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
        Ok(vec![self.config.clone()])
    }

    async fn supports_dataset(&self, dataset: &str) -> ConfigurationResult<bool> {
        Ok(self.config.dataset() == dataset)
    }

    async fn dataset_config_by_internal_name(
        &self,
        dataset: &str,
        internal_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        if !self.config.matches_internal_name(dataset, internal_name) {
            return Ok(None);
        }
        self.lazy_load(self.config.shallow_copy()).await.map(Some)
    }

    async fn dataset_config_by_display_name(
        &self,
        dataset: &str,
        display_name: &str,
    ) -> ConfigurationResult<Option<DatasetConfig>> {
        if !self.config.matches_display_name(dataset, display_name) {
            return Ok(None);
        }
        self.lazy_load(self.config.shallow_copy()).await.map(Some)
    }

    async fn lazy_load(&self, config: DatasetConfig) -> ConfigurationResult<DatasetConfig> {
        if config.is_loaded() {
            return Ok(config);
        }
        check_owner(self.id, &self.name, &config)?;
        Ok(config.populate_from(self.config.clone()))
    }

    async fn mart_locations(&self) -> ConfigurationResult<Vec<MartLocation>> {
        Err(ConfigurationError::NoLocationBacking {
            adaptor: self.name.clone(),
        })
    }

    async fn update(&self) -> ConfigurationResult<()> {
        Ok(())
    }

    fn clear_cache(&self) {}
}

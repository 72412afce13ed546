//! Leaf adaptor over dataset config documents on disk.

use super::cache::{CacheStatistics, ConfigCache, ConfigKey};
use super::{check_owner, AdaptorId, DsConfigAdaptor};
use crate::dataset_config::DatasetConfig;
use crate::document::read_dataset_config_file;
use crate::entity::Entity;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::{MartLocation, UrlLocation};
use crate::settings::AdaptorSettings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use url::Url;
use walkdir::WalkDir;

#[cfg(test)]
#[path = "filesystem_tests.rs"]
mod tests;

const DOCUMENT_EXTENSION: &str = "toml";

/// Reads dataset config documents from a single file or a directory tree.
///
/// Listings come from a cache of shallow configs filled on first use and
/// refreshed by `update`. Full configs are re-read from their file on
/// `lazy_load`, at most once per config until the next refresh. Hidden
/// configs and elements are dropped unless `include_hidden` is set.
///
/// Every listed config is owned by this instance, so two adaptors over
/// different roots never accept each other's configs even when they share
/// a name.
#[derive(Debug)]
pub struct FilesystemAdaptor {
    id: AdaptorId,
    name: String,
    display_name: String,
    root: PathBuf,
    settings: AdaptorSettings,
    cache: ConfigCache<PathBuf>,
}

impl FilesystemAdaptor {
    /// Create an adaptor for a document file or directory.
    ///
    /// Nothing is read until the first listing or lookup. A directory is
    /// walked recursively and every `.toml` file below it must hold one
    /// dataset config document.
    ///
    /// # Arguments
    ///
    /// * `path` - A single document file or a directory of documents
    /// * `settings` - Controls whether hidden configs and elements are kept
    ///
    /// # Returns
    ///
    /// An adaptor named after the file stem of `path`, or after the whole
    /// path when it has no stem.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::FileNotFound` when `path` does not exist.
    pub fn new(path: impl Into<PathBuf>, settings: AdaptorSettings) -> ConfigurationResult<Self> {
        let root = path.into();
        if !root.exists() {
            return Err(ConfigurationError::FileNotFound {
                path: root.display().to_string(),
            });
        }

        let name = root
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        Ok(Self {
            id: AdaptorId::new(),
            display_name: name.clone(),
            name,
            root,
            settings,
            cache: ConfigCache::new(),
        })
    }

    /// Rename the adaptor.
    ///
    /// The instance identity is kept, so configs already handed out are
    /// still accepted by `lazy_load`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Counters and timestamps of the listing cache.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    /// Document files below the root, sorted by path.
    fn document_files(root: &Path) -> ConfigurationResult<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| ConfigurationError::FileAccessError {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;

            let is_document = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == DOCUMENT_EXTENSION);
            if is_document {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Read every document and keep shallow, owned copies.
    fn scan(&self) -> ConfigurationResult<Vec<(DatasetConfig, PathBuf)>> {
        let mut entries = Vec::new();

        for file in Self::document_files(&self.root)? {
            let config = read_dataset_config_file(&file)?;
            if config.is_hidden() && !self.settings.include_hidden {
                debug!("Skipping hidden dataset config in {:?}", file);
                continue;
            }
            entries.push((config.with_owner(self.id, self.name.clone()).shallow_copy(), file));
        }

        Ok(entries)
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
impl DsConfigAdaptor for FilesystemAdaptor {
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

    /// Fill in a shallow config from its document.
    ///
    /// The document is re-read at most once per config until the next
    /// `update` or `clear_cache`; later calls reuse the cached structure.
    /// Loaded configs are returned unchanged.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::ForeignDatasetConfig` - `config` was listed by
    ///   another adaptor instance
    /// * `ConfigurationError::BackingSourceFailed` - the config is no longer
    ///   listed under the root
    /// * Any read or parse error of the document file
    #[instrument(skip(self, config), fields(adaptor = %self.name, dataset = %config.dataset()))]
    async fn lazy_load(&self, config: DatasetConfig) -> ConfigurationResult<DatasetConfig> {
        if config.is_loaded() {
            return Ok(config);
        }
        check_owner(self.id, &self.name, &config)?;

        let key = ConfigKey::of(&config);
        if self.cache.origin(&key).is_none() {
            self.cached_configs().await?;
        }
        let file = self
            .cache
            .origin(&key)
            .ok_or_else(|| ConfigurationError::BackingSourceFailed {
                adaptor: self.name.clone(),
                reason: format!(
                    "{}/{} is no longer listed under {}",
                    config.dataset(),
                    config.internal_name(),
                    self.root.display()
                ),
            })?;

        let include_hidden = self.settings.include_hidden;
        let full = self
            .cache
            .load_once(key, || async {
                debug!("Loading full dataset config from {:?}", file);
                let full = read_dataset_config_file(&file)?;
                Ok(if include_hidden {
                    full
                } else {
                    full.without_hidden()
                })
            })
            .await?;

        Ok(config.populate_from(full))
    }

    /// A `file://` URL location for the document root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::FileAccessError` when the root cannot be
    /// made absolute, and `ConfigurationError::UnsupportedLocation` when the
    /// absolute path has no URL form.
    async fn mart_locations(&self) -> ConfigurationResult<Vec<MartLocation>> {
        let absolute =
            std::fs::canonicalize(&self.root).map_err(|e| ConfigurationError::FileAccessError {
                path: self.root.display().to_string(),
                reason: e.to_string(),
            })?;

        let url = Url::from_file_path(&absolute).map_err(|_| {
            ConfigurationError::UnsupportedLocation {
                location: absolute.display().to_string(),
                reason: "path cannot be expressed as a file URL".to_string(),
            }
        })?;

        Ok(vec![UrlLocation::from_url(&self.name, url)?.into()])
    }

    /// Rescan the documents; on failure the previous listing is kept.
    ///
    /// A successful rescan also drops every cached full config, so the
    /// next `lazy_load` reads from disk again.
    ///
    /// # Errors
    ///
    /// Returns the first walk, read or parse error met during the scan.
    #[instrument(skip(self), fields(adaptor = %self.name, root = %self.root.display()))]
    async fn update(&self) -> ConfigurationResult<()> {
        match self.scan() {
            Ok(entries) => {
                info!("Found {} dataset configs", entries.len());
                self.cache.replace(entries);
                Ok(())
            }
            Err(e) => {
                warn!("Rescan failed, keeping cached configs: {}", e);
                Err(e)
            }
        }
    }

    fn clear_cache(&self) {
        self.cache.clear();
    }
}

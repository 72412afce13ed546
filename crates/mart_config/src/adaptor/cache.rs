//! Config cache shared by the adaptors that read from a backing source.

use crate::dataset_config::DatasetConfig;
use crate::errors::ConfigurationResult;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::OnceCell;
use tracing::debug;

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

/// Cache performance statistics.
///
/// # Examples
///
/// ```
/// use mart_config::CacheStatistics;
///
/// let stats = CacheStatistics {
///     total_requests: 4,
///     cache_hits: 3,
///     cache_misses: 1,
///     ..Default::default()
/// };
///
/// assert_eq!(stats.hit_ratio(), 0.75);
/// assert_eq!(CacheStatistics::default().hit_ratio(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStatistics {
    /// Listing requests made against the cache
    pub total_requests: u64,

    /// Requests served from the cached list
    pub cache_hits: u64,

    /// Requests that found no cached list
    pub cache_misses: u64,

    /// Configs in the cached list
    pub cached_entries: usize,

    /// Full configs loaded from the backing source
    pub loads: u64,

    /// When the cached list was last replaced
    pub last_refresh: Option<DateTime<Utc>>,
}

impl CacheStatistics {
    /// Hit ratio between 0.0 and 1.0; 0.0 before any request.
    pub fn hit_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ConfigKey {
    dataset: String,
    internal_name: String,
}

impl ConfigKey {
    pub(crate) fn of(config: &DatasetConfig) -> Self {
        Self {
            dataset: config.dataset().to_string(),
            internal_name: config.internal_name().to_string(),
        }
    }
}

/// Shallow configs listed from a backing source, each paired with the
/// origin it was read from, plus at-most-once full loads per config.
#[derive(Debug)]
pub(crate) struct ConfigCache<O> {
    entries: RwLock<Option<Vec<(DatasetConfig, O)>>>,
    loads: Mutex<HashMap<ConfigKey, Arc<OnceCell<DatasetConfig>>>>,
    stats: RwLock<CacheStatistics>,
}

impl<O: Clone> ConfigCache<O> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(None),
            loads: Mutex::new(HashMap::new()),
            stats: RwLock::new(CacheStatistics::default()),
        }
    }

    /// The cached list, or `None` when nothing has been cached yet.
    pub(crate) fn entries(&self) -> Option<Vec<(DatasetConfig, O)>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.total_requests += 1;
        if entries.is_some() {
            stats.cache_hits += 1;
        } else {
            stats.cache_misses += 1;
        }

        entries
    }

    /// Configs in the cached list, without origins.
    pub(crate) fn configs(&self) -> Option<Vec<DatasetConfig>> {
        self.entries()
            .map(|entries| entries.into_iter().map(|(config, _)| config).collect())
    }

    /// Origin of the cached config with the given identity.
    pub(crate) fn origin(&self, key: &ConfigKey) -> Option<O> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()?
            .iter()
            .find(|(config, _)| ConfigKey::of(config) == *key)
            .map(|(_, origin)| origin.clone())
    }

    /// Replace the cached list. Completed loads are dropped since they
    /// may no longer match the backing source.
    pub(crate) fn replace(&self, entries: Vec<(DatasetConfig, O)>) {
        let count = entries.len();
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Some(entries);
        self.loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.cached_entries = count;
        stats.last_refresh = Some(Utc::now());
        debug!("Config cache refreshed with {} entries", count);
    }

    pub(crate) fn clear(&self) {
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .cached_entries = 0;
    }

    /// Run `load` for `key` at most once; concurrent callers wait for the
    /// first and share its result. A failed load may be retried.
    pub(crate) async fn load_once<F, Fut>(
        &self,
        key: ConfigKey,
        load: F,
    ) -> ConfigurationResult<DatasetConfig>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ConfigurationResult<DatasetConfig>>,
    {
        let cell = {
            let mut loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(loads.entry(key).or_default())
        };

        let config = cell
            .get_or_try_init(|| async {
                self.stats
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .loads += 1;
                load().await
            })
            .await?;

        Ok(config.clone())
    }

    pub(crate) fn statistics(&self) -> CacheStatistics {
        *self.stats.read().unwrap_or_else(PoisonError::into_inner)
    }
}

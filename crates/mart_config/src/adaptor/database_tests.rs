//! Tests for the database adaptor.

use super::*;
use crate::descriptions::{AttributeCollection, AttributeDescription, AttributePage};
use crate::errors::ConfigurationError;
use std::sync::Mutex;

/// Store with a fixed set of configs that counts calls.
#[derive(Default)]
struct MockStore {
    configs: Vec<DatasetConfig>,
    offline: Arc<Mutex<bool>>,
    list_calls: Arc<Mutex<usize>>,
    load_calls: Arc<Mutex<usize>>,
}

impl MockStore {
    fn failure(&self) -> ConfigurationError {
        ConfigurationError::BackingSourceFailed {
            adaptor: "mock".to_string(),
            reason: "database offline".to_string(),
        }
    }
}

#[async_trait]
impl DatasetConfigStore for MockStore {
    async fn list_dataset_configs(
        &self,
        _connection: &ConnectionParameters,
    ) -> ConfigurationResult<Vec<DatasetConfig>> {
        *self.list_calls.lock().unwrap() += 1;
        if *self.offline.lock().unwrap() {
            return Err(self.failure());
        }
        Ok(self.configs.iter().map(DatasetConfig::shallow_copy).collect())
    }

    async fn load_dataset_config(
        &self,
        _connection: &ConnectionParameters,
        dataset: &str,
        internal_name: &str,
    ) -> ConfigurationResult<DatasetConfig> {
        *self.load_calls.lock().unwrap() += 1;
        if *self.offline.lock().unwrap() {
            return Err(self.failure());
        }
        self.configs
            .iter()
            .find(|c| c.matches_internal_name(dataset, internal_name))
            .cloned()
            .ok_or_else(|| self.failure())
    }
}

struct ReachableProbe;

#[async_trait]
impl ConnectionProbe for ReachableProbe {
    async fn open(&self, _parameters: &ConnectionParameters) -> ConfigurationResult<()> {
        Ok(())
    }
}

struct UnreachableProbe;

#[async_trait]
impl ConnectionProbe for UnreachableProbe {
    async fn open(&self, parameters: &ConnectionParameters) -> ConfigurationResult<()> {
        Err(ConfigurationError::ConnectionFailed {
            location: parameters.display_name.clone(),
            reason: "connection refused".to_string(),
        })
    }
}

fn location() -> RegistryDbLocation {
    RegistryDbLocation::new("martdb.example.org", "anonymous", "mart_110", "mart_110")
        .unwrap()
        .with_name("mart")
}

fn snp_config() -> DatasetConfig {
    let mut hidden = AttributeDescription::new("internal_key", "key", "main").unwrap();
    hidden.entity_mut().set("hidden", "true");

    DatasetConfig::new("snp", "snp_config", "Variation")
        .unwrap()
        .with_attribute_page(
            AttributePage::new("snp").unwrap().with_collection(
                AttributeCollection::new("ids")
                    .unwrap()
                    .with_description(AttributeDescription::new("refsnp_id", "refsnp_id", "main").unwrap())
                    .with_description(hidden),
            ),
        )
}

fn store() -> MockStore {
    MockStore {
        configs: vec![
            snp_config(),
            DatasetConfig::new("gene", "gene_config", "Genes").unwrap(),
        ],
        ..Default::default()
    }
}

async fn adaptor(store: MockStore) -> DatabaseAdaptor {
    DatabaseAdaptor::connect(location(), Arc::new(store), &ReachableProbe, AdaptorSettings::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_connect_validates_location() {
    let result = DatabaseAdaptor::connect(
        location(),
        Arc::new(store()),
        &UnreachableProbe,
        AdaptorSettings::default(),
    )
    .await;

    assert!(matches!(result, Err(ConfigurationError::ConnectionFailed { .. })));
}

#[tokio::test]
async fn test_data_source_and_locations() {
    let adaptor = adaptor(store()).await;

    let source = adaptor.data_source().unwrap();
    assert_eq!(source.connection_string, "mysql://martdb.example.org:3306/mart_110");
    assert_eq!(source.display_name, "mart");
    assert_eq!(adaptor.name(), "mart");

    let locations = adaptor.mart_locations().await.unwrap();
    assert_eq!(locations, vec![MartLocation::Database(location())]);
}

#[tokio::test]
async fn test_listing_is_cached() {
    let store = store();
    let list_calls = Arc::clone(&store.list_calls);
    let adaptor = adaptor(store).await;

    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 2);
    assert_eq!(adaptor.dataset_names().await.unwrap(), vec!["snp", "gene"]);
    assert!(adaptor.supports_dataset("gene").await.unwrap());

    assert_eq!(*list_calls.lock().unwrap(), 1);
    let stats = adaptor.cache_statistics();
    assert!(stats.cache_hits >= 2);
    assert_eq!(stats.cached_entries, 2);
}

#[tokio::test]
async fn test_lookup_fetches_full_config_once() {
    let store = store();
    let load_calls = Arc::clone(&store.load_calls);
    let adaptor = adaptor(store).await;

    for _ in 0..3 {
        let config = adaptor
            .dataset_config_by_internal_name("snp", "snp_config")
            .await
            .unwrap()
            .unwrap();
        assert!(config.is_loaded());
        assert_eq!(config.adaptor(), Some("mart"));
        assert_eq!(config.attribute_pages()[0].descriptions().count(), 1);
    }

    assert_eq!(*load_calls.lock().unwrap(), 1);
    assert!(adaptor
        .dataset_config_by_display_name("snp", "Genes")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_concurrent_lazy_loads_fetch_once() {
    let store = store();
    let load_calls = Arc::clone(&store.load_calls);
    let adaptor = Arc::new(adaptor(store).await);
    let shallow = adaptor.dataset_configs_by_dataset("snp").await.unwrap().remove(0);

    let mut handles = Vec::new();
    for _ in 0..6 {
        let adaptor = Arc::clone(&adaptor);
        let shallow = shallow.clone();
        handles.push(tokio::spawn(async move { adaptor.lazy_load(shallow).await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_loaded());
    }

    assert_eq!(*load_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_failed_update_keeps_previous_cache() {
    let store = store();
    let offline = Arc::clone(&store.offline);
    let adaptor = adaptor(store).await;
    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 2);

    *offline.lock().unwrap() = true;
    let err = adaptor.update().await.unwrap_err();
    assert!(matches!(err, ConfigurationError::BackingSourceFailed { .. }));

    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_first_listing_is_surfaced() {
    let store = store();
    *store.offline.lock().unwrap() = true;
    let adaptor = adaptor(store).await;

    assert!(adaptor.dataset_configs().await.is_err());
    assert!(adaptor
        .dataset_config_by_internal_name("snp", "snp_config")
        .await
        .is_err());
}

#[tokio::test]
async fn test_clear_cache_relists() {
    let store = store();
    let list_calls = Arc::clone(&store.list_calls);
    let adaptor = adaptor(store).await;

    adaptor.dataset_configs().await.unwrap();
    adaptor.clear_cache();
    adaptor.dataset_configs().await.unwrap();

    assert_eq!(*list_calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_lazy_load_rejects_foreign_config() {
    let adaptor = adaptor(store()).await;
    let foreign = snp_config()
        .with_owner(AdaptorId::new(), "mart")
        .shallow_copy();

    assert!(matches!(
        adaptor.lazy_load(foreign).await,
        Err(ConfigurationError::ForeignDatasetConfig { .. })
    ));
}

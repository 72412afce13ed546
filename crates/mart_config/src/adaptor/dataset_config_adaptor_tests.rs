//! Tests for the single-config leaf adaptor.

use super::*;
use crate::dataset_config::LoadState;
use crate::descriptions::{AttributeCollection, AttributeDescription, AttributePage};
use std::sync::Arc;

fn snp_config() -> DatasetConfig {
    DatasetConfig::new("snp", "snp_config", "Variation")
        .unwrap()
        .with_attribute_page(
            AttributePage::new("snp").unwrap().with_collection(
                AttributeCollection::new("ids")
                    .unwrap()
                    .with_description(AttributeDescription::new("refsnp_id", "refsnp_id", "main").unwrap()),
            ),
        )
}

#[tokio::test]
async fn test_lookup_by_internal_name_is_exact() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());

    let found = adaptor
        .dataset_config_by_internal_name("snp", "snp_config")
        .await
        .unwrap()
        .unwrap();
    assert!(found.is_loaded());
    assert_eq!(found.attribute_pages().len(), 1);
    assert_eq!(found.adaptor(), Some("snp.snp_config"));
    assert!(found.is_owned_by(adaptor.id()));

    for (dataset, name) in [("snp", "other"), ("gene", "snp_config"), ("", "")] {
        assert!(adaptor
            .dataset_config_by_internal_name(dataset, name)
            .await
            .unwrap()
            .is_none());
    }
}

#[tokio::test]
async fn test_lookup_by_display_name() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());

    assert!(adaptor
        .dataset_config_by_display_name("snp", "Variation")
        .await
        .unwrap()
        .is_some());
    assert!(adaptor
        .dataset_config_by_display_name("snp", "snp_config")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_lookups_return_copies() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());

    let mut copy = adaptor
        .dataset_config_by_internal_name("snp", "snp_config")
        .await
        .unwrap()
        .unwrap();
    copy.add_attribute_page(AttributePage::new("extra").unwrap());

    assert_eq!(adaptor.config().attribute_pages().len(), 1);
}

#[tokio::test]
async fn test_listing_and_support() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());

    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 1);
    assert_eq!(adaptor.dataset_names().await.unwrap(), vec!["snp"]);
    assert!(adaptor.supports_dataset("snp").await.unwrap());
    assert!(!adaptor.supports_dataset("gene").await.unwrap());
    assert!(adaptor.dataset_configs_by_dataset("gene").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_has_no_children() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());

    assert!(!adaptor.is_composite());
    assert!(adaptor.child_adaptors().is_empty());
    assert!(adaptor.adaptor_names().is_empty());
    assert!(!adaptor.supports_adaptor("snp.snp_config"));

    let shared: Arc<dyn DsConfigAdaptor> = Arc::new(adaptor);
    let leaves = crate::adaptor::leaf_adaptors(&shared);
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].name(), "snp.snp_config");
}

#[tokio::test]
async fn test_lazy_load_fills_owned_shallow_copy() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());
    let shallow = adaptor.config().shallow_copy();
    assert_eq!(shallow.state(), LoadState::Unloaded);

    let loaded = adaptor.lazy_load(shallow).await.unwrap();
    assert_eq!(&loaded, adaptor.config());
}

#[tokio::test]
async fn test_lazy_load_rejects_foreign_config() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());
    let foreign = snp_config()
        .with_owner(AdaptorId::new(), "elsewhere")
        .shallow_copy();

    let err = adaptor.lazy_load(foreign).await.unwrap_err();
    assert!(matches!(err, ConfigurationError::ForeignDatasetConfig { ref owner, .. } if owner == "elsewhere"));
}

#[tokio::test]
async fn test_lazy_load_rejects_config_of_same_named_adaptor() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());
    let twin = DatasetConfigAdaptor::new(snp_config());
    assert_eq!(adaptor.name(), twin.name());
    assert_ne!(adaptor.id(), twin.id());

    let err = adaptor
        .lazy_load(twin.config().shallow_copy())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::ForeignDatasetConfig { .. }));
}

#[tokio::test]
async fn test_lazy_load_passes_loaded_config_through() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());
    let unrelated = DatasetConfig::new("gene", "gene_config", "").unwrap();

    assert_eq!(adaptor.lazy_load(unrelated.clone()).await.unwrap(), unrelated);
}

#[tokio::test]
async fn test_mart_locations_fail() {
    let adaptor = DatasetConfigAdaptor::new(snp_config()).with_name("snp");

    let err = adaptor.mart_locations().await.unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::NoLocationBacking {
            adaptor: "snp".to_string()
        }
    );
}

#[tokio::test]
async fn test_update_and_clear_are_no_ops() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());

    adaptor.update().await.unwrap();
    adaptor.clear_cache();
    assert!(adaptor
        .dataset_config_by_internal_name("snp", "snp_config")
        .await
        .unwrap()
        .is_some());
    assert!(adaptor.data_source().is_none());
}

#[test]
fn test_equality_follows_wrapped_config() {
    assert_eq!(
        DatasetConfigAdaptor::new(snp_config()),
        DatasetConfigAdaptor::new(snp_config())
    );
    assert_ne!(
        DatasetConfigAdaptor::new(snp_config()),
        DatasetConfigAdaptor::new(DatasetConfig::new("snp", "snp_config", "").unwrap())
    );
}

#[test]
fn test_unlabelled_config_is_labelled_with_adaptor_name() {
    let adaptor = DatasetConfigAdaptor::new(DatasetConfig::new("gene", "default", "").unwrap());

    assert_eq!(adaptor.name(), "gene.default");
    assert_eq!(adaptor.display_name(), "gene.default");
}

#[test]
fn test_names() {
    let adaptor = DatasetConfigAdaptor::new(snp_config());
    assert_eq!(adaptor.name(), "snp.snp_config");
    assert_eq!(adaptor.display_name(), "Variation");

    let id = adaptor.id();
    let renamed = adaptor.with_name("snp").with_display_name("SNPs");
    assert_eq!(renamed.id(), id);
    assert_eq!(renamed.config().adaptor(), Some("snp"));
    assert!(renamed.config().is_owned_by(id));
    assert_eq!(renamed.display_name(), "SNPs");
}

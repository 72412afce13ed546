//! Tests for the filesystem adaptor.

use super::*;
use std::fs;
use tempfile::TempDir;

fn document(dataset: &str, internal_name: &str, extra: &str) -> String {
    format!(
        r#"
[dataset_config]
internalName = "{internal_name}"
dataset = "{dataset}"
displayName = "{dataset} data"
{extra}

[[dataset_config.attribute_page]]
internalName = "main"

[[dataset_config.attribute_page.collection]]
internalName = "ids"

[[dataset_config.attribute_page.collection.attribute]]
internalName = "{dataset}_id"
field = "id"
tableConstraint = "main"

[[dataset_config.attribute_page.collection.attribute]]
internalName = "internal_key"
field = "key"
tableConstraint = "main"
hidden = true
"#
    )
}

fn source_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("snp.toml"), document("snp", "snp_config", "")).unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(
        dir.path().join("nested").join("gene.toml"),
        document("gene", "gene_config", ""),
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "not a document").unwrap();
    dir
}

#[test]
fn test_new_requires_existing_path() {
    let dir = TempDir::new().unwrap();
    let result = FilesystemAdaptor::new(dir.path().join("absent"), AdaptorSettings::default());
    assert!(matches!(result, Err(ConfigurationError::FileNotFound { .. })));
}

#[tokio::test]
async fn test_directory_listing_is_shallow_and_owned() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default())
        .unwrap()
        .with_name("local");

    let configs = adaptor.dataset_configs().await.unwrap();
    let keys: Vec<(&str, &str)> = configs
        .iter()
        .map(|c| (c.dataset(), c.internal_name()))
        .collect();

    assert_eq!(keys, vec![("gene", "gene_config"), ("snp", "snp_config")]);
    assert!(configs.iter().all(|c| !c.is_loaded()));
    assert!(configs.iter().all(|c| c.adaptor() == Some("local")));
}

#[tokio::test]
async fn test_single_file_source() {
    let dir = source_dir();
    let adaptor =
        FilesystemAdaptor::new(dir.path().join("snp.toml"), AdaptorSettings::default()).unwrap();

    assert_eq!(adaptor.name(), "snp");
    assert_eq!(adaptor.dataset_names().await.unwrap(), vec!["snp"]);
}

#[tokio::test]
async fn test_lookup_loads_full_config_without_hidden_elements() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();

    let config = adaptor
        .dataset_config_by_internal_name("snp", "snp_config")
        .await
        .unwrap()
        .unwrap();

    assert!(config.is_loaded());
    let names: Vec<_> = config.attribute_pages()[0]
        .descriptions()
        .filter_map(|d| d.internal_name())
        .collect();
    assert_eq!(names, vec!["snp_id"]);

    assert!(adaptor
        .dataset_config_by_internal_name("snp", "gene_config")
        .await
        .unwrap()
        .is_none());
    assert!(adaptor
        .dataset_config_by_display_name("gene", "gene data")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_include_hidden_keeps_hidden_elements() {
    let dir = source_dir();
    let settings = AdaptorSettings {
        include_hidden: true,
        ..Default::default()
    };
    let adaptor = FilesystemAdaptor::new(dir.path(), settings).unwrap();

    let config = adaptor
        .dataset_config_by_internal_name("snp", "snp_config")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(config.attribute_pages()[0].descriptions().count(), 2);
}

#[tokio::test]
async fn test_hidden_dataset_config_is_not_listed() {
    let dir = source_dir();
    fs::write(
        dir.path().join("internal.toml"),
        document("internal", "internal_config", "hidden = \"true\""),
    )
    .unwrap();

    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();
    assert!(!adaptor.supports_dataset("internal").await.unwrap());

    let settings = AdaptorSettings {
        include_hidden: true,
        ..Default::default()
    };
    let adaptor = FilesystemAdaptor::new(dir.path(), settings).unwrap();
    assert!(adaptor.supports_dataset("internal").await.unwrap());
}

#[tokio::test]
async fn test_full_config_is_read_once() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();

    for _ in 0..3 {
        adaptor
            .dataset_config_by_internal_name("snp", "snp_config")
            .await
            .unwrap();
    }

    assert_eq!(adaptor.cache_statistics().loads, 1);
}

#[tokio::test]
async fn test_lazy_load_of_listed_config() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();

    let shallow = adaptor.dataset_configs_by_dataset("gene").await.unwrap().remove(0);
    let loaded = adaptor.lazy_load(shallow.clone()).await.unwrap();

    assert!(loaded.is_loaded());
    assert_eq!(loaded.entity(), shallow.entity());
    assert_eq!(loaded.attribute_pages().len(), 1);
}

#[tokio::test]
async fn test_lazy_load_rejects_foreign_config() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();
    let foreign = DatasetConfig::new("snp", "snp_config", "")
        .unwrap()
        .with_owner(AdaptorId::new(), "elsewhere")
        .shallow_copy();

    assert!(matches!(
        adaptor.lazy_load(foreign).await,
        Err(ConfigurationError::ForeignDatasetConfig { .. })
    ));
}

#[tokio::test]
async fn test_update_picks_up_new_documents() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();
    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 2);

    fs::write(dir.path().join("go.toml"), document("go", "go_config", "")).unwrap();
    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 2);

    adaptor.update().await.unwrap();
    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_failed_update_keeps_previous_cache() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();
    assert_eq!(adaptor.dataset_configs().await.unwrap().len(), 2);

    fs::write(dir.path().join("broken.toml"), "[dataset_config\n").unwrap();
    let err = adaptor.update().await.unwrap_err();
    assert!(matches!(err, ConfigurationError::ParseError { .. }));

    let configs = adaptor.dataset_configs().await.unwrap();
    assert_eq!(configs.len(), 2);
}

#[tokio::test]
async fn test_clear_cache_forces_rescan() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default()).unwrap();
    adaptor.dataset_configs().await.unwrap();

    fs::remove_file(dir.path().join("snp.toml")).unwrap();
    adaptor.clear_cache();

    let names = adaptor.dataset_names().await.unwrap();
    assert_eq!(names, vec!["gene"]);
}

#[tokio::test]
async fn test_mart_locations_export_file_url() {
    let dir = source_dir();
    let adaptor = FilesystemAdaptor::new(dir.path(), AdaptorSettings::default())
        .unwrap()
        .with_name("local");

    let locations = adaptor.mart_locations().await.unwrap();
    assert_eq!(locations.len(), 1);
    match &locations[0] {
        MartLocation::Url(location) => {
            assert_eq!(location.name(), "local");
            assert_eq!(location.url().scheme(), "file");
        }
        other => panic!("unexpected location: {:?}", other),
    }
    assert!(adaptor.data_source().is_none());
}

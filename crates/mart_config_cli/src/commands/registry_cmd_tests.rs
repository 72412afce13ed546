//! Tests for registry inspection commands.

use super::*;
use mart_config::ConfigurationError;
use std::fs;
use tempfile::TempDir;

const REGISTRY: &str = r#"
name = "ensembl"

[[virtual_schema]]
name = "default"

[[virtual_schema.location]]
type = "database"
name = "genes"
host = "ensembldb.example.org"
instance_name = "ensembl_mart_110"
schema = "ensembl_mart_110"
user = "anonymous"

[[virtual_schema.location]]
type = "url"
name = "central"
url = "https://www.example.org/registry.toml"
visible = false

[[virtual_schema]]
name = "plants"
visible = false
"#;

#[test]
fn test_list_locations() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("registry.toml");
    fs::write(&path, REGISTRY).expect("Failed to write registry");

    let output = list_locations(&LocationsArgs { registry: path }).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("ensembl"));
    assert!(lines[1].contains("default"));
    assert!(lines[2].contains("[database] genes anonymous@ensembldb.example.org/"));
    assert!(lines[3].contains("[url] central https://www.example.org/registry.toml"));
    assert!(lines[3].ends_with("(hidden)"));
    assert!(lines[4].contains("plants"));
    assert!(lines[4].ends_with("(hidden)"));
}

#[test]
fn test_list_locations_missing_registry() {
    let dir = TempDir::new().expect("Failed to create temp directory");

    let result = list_locations(&LocationsArgs {
        registry: dir.path().join("absent.toml"),
    });
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::FileNotFound { .. }))
    ));
}

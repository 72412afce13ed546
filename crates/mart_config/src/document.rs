//! Dataset configuration documents in TOML.
//!
//! Every element maps to one entity; its scalar keys become attributes in
//! document order and its array-of-tables keys hold child elements.
//!
//! ```toml
//! [dataset_config]
//! internalName = "snp_config"
//! dataset = "snp"
//! displayName = "Variation"
//!
//! [[dataset_config.attribute_page]]
//! internalName = "snp"
//!
//! [[dataset_config.attribute_page.collection]]
//! internalName = "snp_ids"
//!
//! [[dataset_config.attribute_page.collection.attribute]]
//! internalName = "refsnp_id"
//! field = "refsnp_id"
//! tableConstraint = "main"
//!
//! [[dataset_config.exportable]]
//! linkName = "snp_id_link"
//! attributes = "refsnp_id"
//! ```
//!
//! Booleans and numbers are accepted and kept as their string form.

use crate::dataset_config::{DatasetConfig, DynamicDataset, LoadState};
use crate::descriptions::{
    AttributeDescription, Collection, Description, FilterDescription, LinkDescription, LinkKind,
    Page,
};
use crate::entity::{ConfigurationEntity, Entity, EntityKind};
use crate::errors::{ConfigurationError, ConfigurationResult};
use std::path::Path;
use toml::{Table, Value};
use tracing::debug;

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

const COLLECTION: &str = "collection";

const DATASET_CHILDREN: [&str; 5] = [
    "filter_page",
    "attribute_page",
    "exportable",
    "importable",
    "dynamic_dataset",
];

/// Parse a dataset configuration document into a loaded config.
///
/// # Errors
///
/// * `ConfigurationError::ParseError` - invalid TOML, a missing
///   `[dataset_config]` table, or a value of an unsupported shape
/// * `ConfigurationError::RequiredFieldMissing` - the dataset, a link or a
///   dynamic dataset lacks a mandatory attribute
pub fn parse_dataset_config(content: &str) -> ConfigurationResult<DatasetConfig> {
    let document: Table = toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
        reason: format!("dataset config document: {}", e),
    })?;

    let root = match document.get(EntityKind::Dataset.element_name()) {
        Some(Value::Table(root)) => root,
        _ => {
            return Err(ConfigurationError::ParseError {
                reason: "document has no [dataset_config] table".to_string(),
            })
        }
    };

    let path = EntityKind::Dataset.element_name();
    let entity = entity_from_table(EntityKind::Dataset, root, &DATASET_CHILDREN, path)?;
    let mut config = DatasetConfig::from_entity(entity, LoadState::Loaded)?;

    for (i, table) in child_tables(root, "filter_page", path)?.into_iter().enumerate() {
        config.add_filter_page(parse_page::<FilterDescription>(
            table,
            &format!("{}.filter_page[{}]", path, i),
        )?);
    }
    for (i, table) in child_tables(root, "attribute_page", path)?.into_iter().enumerate() {
        config.add_attribute_page(parse_page::<AttributeDescription>(
            table,
            &format!("{}.attribute_page[{}]", path, i),
        )?);
    }
    for (kind, key) in [
        (LinkKind::Exportable, "exportable"),
        (LinkKind::Importable, "importable"),
    ] {
        for (i, table) in child_tables(root, key, path)?.into_iter().enumerate() {
            let element_path = format!("{}.{}[{}]", path, key, i);
            let entity = entity_from_table(kind_of(kind), table, &[], &element_path)?;
            let link = LinkDescription::from_entity(kind, entity)?;
            match kind {
                LinkKind::Exportable => config.add_exportable(link),
                LinkKind::Importable => config.add_importable(link),
            }
        }
    }
    for (i, table) in child_tables(root, "dynamic_dataset", path)?.into_iter().enumerate() {
        let element_path = format!("{}.dynamic_dataset[{}]", path, i);
        let entity = entity_from_table(EntityKind::DynamicDataset, table, &[], &element_path)?;
        config.add_dynamic_dataset(DynamicDataset::from_entity(entity)?);
    }

    debug!(
        "Parsed dataset config {}/{}",
        config.dataset(),
        config.internal_name()
    );
    Ok(config)
}

/// Render a config back into a document of the shape
/// [`parse_dataset_config`] reads. Cleared attributes are omitted.
pub fn render_dataset_config(config: &DatasetConfig) -> ConfigurationResult<String> {
    let mut root = entity_table(config.entity());

    insert_array(
        &mut root,
        "filter_page",
        config.filter_pages().iter().map(page_table).collect(),
    );
    insert_array(
        &mut root,
        "attribute_page",
        config.attribute_pages().iter().map(page_table).collect(),
    );
    insert_array(
        &mut root,
        "exportable",
        config.exportables().iter().map(|l| entity_table(l.entity())).collect(),
    );
    insert_array(
        &mut root,
        "importable",
        config.importables().iter().map(|l| entity_table(l.entity())).collect(),
    );
    insert_array(
        &mut root,
        "dynamic_dataset",
        config
            .dynamic_datasets()
            .iter()
            .map(|d| entity_table(d.entity()))
            .collect(),
    );

    let mut document = Table::new();
    document.insert(
        EntityKind::Dataset.element_name().to_string(),
        Value::Table(root),
    );

    toml::to_string(&document).map_err(|e| ConfigurationError::ParseError {
        reason: format!("cannot render dataset config '{}': {}", config.internal_name(), e),
    })
}

/// Read and parse a document file.
pub fn read_dataset_config_file(path: &Path) -> ConfigurationResult<DatasetConfig> {
    if !path.exists() {
        return Err(ConfigurationError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigurationError::FileAccessError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    parse_dataset_config(&content).map_err(|e| match e {
        ConfigurationError::ParseError { reason } => ConfigurationError::ParseError {
            reason: format!("{}: {}", path.display(), reason),
        },
        other => other,
    })
}

/// Render a config and write it to `path`.
pub fn write_dataset_config_file(path: &Path, config: &DatasetConfig) -> ConfigurationResult<()> {
    let content = render_dataset_config(config)?;
    std::fs::write(path, content).map_err(|e| ConfigurationError::FileAccessError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn kind_of(kind: LinkKind) -> EntityKind {
    match kind {
        LinkKind::Exportable => EntityKind::Exportable,
        LinkKind::Importable => EntityKind::Importable,
    }
}

fn parse_page<D: Description>(table: &Table, path: &str) -> ConfigurationResult<Page<D>> {
    let description_key = D::KIND.element_name();
    let entity = entity_from_table(D::PAGE_KIND, table, &[COLLECTION], path)?;
    let mut page = Page::<D>::from_entity(entity);

    for (i, collection_table) in child_tables(table, COLLECTION, path)?.into_iter().enumerate() {
        let collection_path = format!("{}.{}[{}]", path, COLLECTION, i);
        let entity = entity_from_table(
            D::COLLECTION_KIND,
            collection_table,
            &[description_key],
            &collection_path,
        )?;
        let mut collection = Collection::<D>::from_entity(entity);

        for (j, description_table) in child_tables(collection_table, description_key, &collection_path)?
            .into_iter()
            .enumerate()
        {
            let description_path = format!("{}.{}[{}]", collection_path, description_key, j);
            let entity = entity_from_table(D::KIND, description_table, &[], &description_path)?;
            collection.push(D::from_entity(entity));
        }

        page.push(collection);
    }

    Ok(page)
}

fn entity_from_table(
    kind: EntityKind,
    table: &Table,
    children: &[&str],
    path: &str,
) -> ConfigurationResult<ConfigurationEntity> {
    let mut entity = ConfigurationEntity::new(kind);

    for (key, value) in table {
        if children.contains(&key.as_str()) {
            continue;
        }

        let text = scalar_text(value).ok_or_else(|| ConfigurationError::ParseError {
            reason: format!(
                "{}: '{}' must be a string, boolean or number, found {}",
                path,
                key,
                value.type_str()
            ),
        })?;
        entity.set(key, text);
    }

    Ok(entity)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Integer(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Boolean(flag) => Some(flag.to_string()),
        Value::Datetime(datetime) => Some(datetime.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

fn child_tables<'a>(table: &'a Table, key: &str, path: &str) -> ConfigurationResult<Vec<&'a Table>> {
    let not_tables = || ConfigurationError::ParseError {
        reason: format!("{}: '{}' must be an array of tables", path, key),
    };

    match table.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_table().ok_or_else(not_tables))
            .collect(),
        Some(_) => Err(not_tables()),
    }
}

fn entity_table(entity: &ConfigurationEntity) -> Table {
    let mut table = Table::new();
    for (key, value) in entity.attributes().iter() {
        if let Some(value) = value {
            table.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    table
}

fn page_table<D: Description>(page: &Page<D>) -> Table {
    let description_key = D::KIND.element_name();
    let mut table = entity_table(page.entity());

    let collections = page
        .collections()
        .iter()
        .map(|collection| {
            let mut collection_table = entity_table(collection.entity());
            insert_array(
                &mut collection_table,
                description_key,
                collection
                    .descriptions()
                    .iter()
                    .map(|d| entity_table(d.entity()))
                    .collect(),
            );
            collection_table
        })
        .collect();

    insert_array(&mut table, COLLECTION, collections);
    table
}

fn insert_array(table: &mut Table, key: &str, items: Vec<Table>) {
    if !items.is_empty() {
        table.insert(
            key.to_string(),
            Value::Array(items.into_iter().map(Value::Table).collect()),
        );
    }
}

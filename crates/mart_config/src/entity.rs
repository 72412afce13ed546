//! Configuration entities built on an [`AttributeStore`].
//!
//! A `ConfigurationEntity` pairs an attribute store with a kind tag and a
//! list of required fields. The required fields are recorded as positions
//! in the title order so that an entity created with placeholders keeps
//! them ahead of any attributes added later.

use crate::attributes::{AttributeState, AttributeStore};
use crate::errors::{ConfigurationError, ConfigurationResult};
use std::cmp::Ordering;
use std::fmt;

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;

pub const INTERNAL_NAME: &str = "internalName";
pub const DISPLAY_NAME: &str = "displayName";
pub const DESCRIPTION: &str = "description";
pub const HIDDEN: &str = "hidden";

/// The kind of configuration element an entity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Dataset,
    FilterPage,
    FilterCollection,
    Filter,
    AttributePage,
    AttributeCollection,
    Attribute,
    Exportable,
    Importable,
    DynamicDataset,
}

impl EntityKind {
    /// Element name used in configuration documents.
    pub fn element_name(&self) -> &'static str {
        match self {
            EntityKind::Dataset => "dataset_config",
            EntityKind::FilterPage => "filter_page",
            EntityKind::FilterCollection | EntityKind::AttributeCollection => "collection",
            EntityKind::Filter => "filter",
            EntityKind::AttributePage => "attribute_page",
            EntityKind::Attribute => "attribute",
            EntityKind::Exportable => "exportable",
            EntityKind::Importable => "importable",
            EntityKind::DynamicDataset => "dynamic_dataset",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element_name())
    }
}

/// A named, typed configuration object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationEntity {
    kind: EntityKind,
    attributes: AttributeStore,
    required_fields: Vec<usize>,
}

impl ConfigurationEntity {
    /// Create an empty entity with no required fields.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            attributes: AttributeStore::new(),
            required_fields: Vec::new(),
        }
    }

    /// Create an entity whose `required` keys are registered up front as
    /// empty title slots.
    pub fn with_required(kind: EntityKind, required: &[&str]) -> Self {
        let mut entity = Self::new(kind);
        for key in required {
            entity.attributes.clear(key);
        }
        entity.required_fields = required
            .iter()
            .filter_map(|key| entity.attributes.title_index(key))
            .collect();
        entity
    }

    /// Wrap an existing attribute store.
    pub fn from_attributes(kind: EntityKind, attributes: AttributeStore) -> Self {
        Self {
            kind,
            attributes,
            required_fields: Vec::new(),
        }
    }

    /// Mark `key` as required, registering it as a title if needed.
    pub fn require(&mut self, key: &str) {
        if !self.attributes.has_title(key) {
            self.attributes.clear(key);
        }
        if let Some(index) = self.attributes.title_index(key) {
            if !self.required_fields.contains(&index) {
                self.required_fields.push(index);
            }
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get_attribute(key)
    }

    pub fn attribute_state(&self, key: &str) -> AttributeState<'_> {
        self.attributes.state(key)
    }

    pub fn set_attribute(&mut self, key: &str, value: Option<&str>) {
        self.attributes.set_attribute(key, value);
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.set(key, value);
    }

    pub fn titles(&self) -> &[String] {
        self.attributes.titles()
    }

    pub fn required_fields(&self) -> &[usize] {
        &self.required_fields
    }

    /// Titles of required fields that hold no value, or only whitespace.
    pub fn missing_required_fields(&self) -> Vec<&str> {
        let titles = self.attributes.titles();
        self.required_fields
            .iter()
            .filter_map(|&index| titles.get(index))
            .filter(|title| {
                self.get_attribute(title)
                    .map_or(true, |value| value.trim().is_empty())
            })
            .map(String::as_str)
            .collect()
    }

    pub fn has_required_fields(&self) -> bool {
        self.missing_required_fields().is_empty()
    }

    /// Fail with `RequiredFieldMissing` for the first missing required field.
    pub fn validate_required(&self) -> ConfigurationResult<()> {
        match self.missing_required_fields().first() {
            Some(field) => Err(ConfigurationError::RequiredFieldMissing {
                entity: self.kind.to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn internal_name(&self) -> Option<&str> {
        self.get_attribute(INTERNAL_NAME)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.get_attribute(DISPLAY_NAME)
    }

    pub fn description(&self) -> Option<&str> {
        self.get_attribute(DESCRIPTION)
    }

    pub fn is_hidden(&self) -> bool {
        is_true(self.get_attribute(HIDDEN))
    }

    pub fn fingerprint(&self) -> u64 {
        self.attributes.fingerprint()
    }

    /// Ordering used for display and sorted storage.
    ///
    /// Compares internal names, then display names, then kinds. It is
    /// unrelated to equality and must not be used to decide merges.
    pub fn display_order(&self, other: &Self) -> Ordering {
        self.internal_name()
            .cmp(&other.internal_name())
            .then_with(|| self.display_name().cmp(&other.display_name()))
            .then_with(|| self.kind.element_name().cmp(other.kind.element_name()))
    }
}

/// Interpret a configuration flag value.
///
/// Documents use `true`/`false` as well as `1`/`0`.
pub fn is_true(value: Option<&str>) -> bool {
    matches!(
        value.map(str::trim),
        Some("true") | Some("TRUE") | Some("True") | Some("1")
    )
}

/// Typed view over a [`ConfigurationEntity`].
///
/// Every entity kind decides for itself when it is broken. Implementations
/// must not panic.
pub trait Entity {
    fn entity(&self) -> &ConfigurationEntity;

    fn entity_mut(&mut self) -> &mut ConfigurationEntity;

    fn is_broken(&self) -> bool;

    fn internal_name(&self) -> Option<&str> {
        self.entity().internal_name()
    }

    fn is_hidden(&self) -> bool {
        self.entity().is_hidden()
    }
}

//! Dataset configurations: the full entity tree describing one queryable
//! dataset, plus the dynamic datasets a template can be specialized into.

use crate::adaptor::AdaptorId;
use crate::descriptions::{AttributePage, FilterPage, LinkDescription};
use crate::entity::{ConfigurationEntity, Entity, EntityKind, DISPLAY_NAME, INTERNAL_NAME};
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::template_resolver::AliasTable;
use std::cmp::Ordering;

#[cfg(test)]
#[path = "dataset_config_tests.rs"]
mod tests;

pub const DATASET: &str = "dataset";
pub const TEMPLATE: &str = "template";
pub const VISIBLE: &str = "visible";
pub const ALIASES: &str = "aliases";

/// The adaptor instance a config belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Owner {
    id: AdaptorId,
    name: String,
}

/// Whether a dataset config carries its deep structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Only the dataset-level attributes are present.
    #[default]
    Unloaded,
    /// Pages, links and dynamic datasets are populated.
    Loaded,
}

/// A concrete dataset a template can be specialized into.
///
/// The alias list (`aliases`) is a comma-separated list of `key=value`
/// pairs, or bare keys meaning "remove the token".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicDataset {
    entity: ConfigurationEntity,
}

impl DynamicDataset {
    pub fn new(internal_name: &str, aliases: &str) -> ConfigurationResult<Self> {
        if internal_name.trim().is_empty() {
            return Err(ConfigurationError::RequiredFieldMissing {
                entity: EntityKind::DynamicDataset.to_string(),
                field: INTERNAL_NAME.to_string(),
            });
        }

        let mut entity =
            ConfigurationEntity::with_required(EntityKind::DynamicDataset, &[INTERNAL_NAME]);
        entity.set(INTERNAL_NAME, internal_name);
        entity.set(ALIASES, aliases);
        Ok(Self { entity })
    }

    pub fn from_entity(entity: ConfigurationEntity) -> ConfigurationResult<Self> {
        let mut adopted = ConfigurationEntity::from_attributes(
            EntityKind::DynamicDataset,
            entity.attributes().clone(),
        );
        adopted.require(INTERNAL_NAME);
        adopted.validate_required()?;
        Ok(Self { entity: adopted })
    }

    pub fn aliases(&self) -> AliasTable {
        AliasTable::parse(self.entity.get_attribute(ALIASES).unwrap_or_default())
    }
}

impl Entity for DynamicDataset {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    fn is_broken(&self) -> bool {
        !self.entity.has_required_fields()
    }
}

/// The full configuration of one dataset.
///
/// A config is owned by exactly one adaptor instance and is either
/// `Unloaded`, holding dataset-level attributes only, or `Loaded`. Only the
/// owning adaptor may turn one into the other.
///
/// Equality is structural over attributes, load state and the entity
/// tree. Ownership is not part of it: the same config held by two adaptors
/// compares equal.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    entity: ConfigurationEntity,
    owner: Option<Owner>,
    state: LoadState,
    filter_pages: Vec<FilterPage>,
    attribute_pages: Vec<AttributePage>,
    exportables: Vec<LinkDescription>,
    importables: Vec<LinkDescription>,
    dynamic_datasets: Vec<DynamicDataset>,
}

impl DatasetConfig {
    const REQUIRED: [&'static str; 2] = [INTERNAL_NAME, DATASET];

    /// Create an empty, loaded config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::RequiredFieldMissing` when the dataset
    /// or internal name is blank.
    pub fn new(dataset: &str, internal_name: &str, display_name: &str) -> ConfigurationResult<Self> {
        let mut entity = ConfigurationEntity::with_required(EntityKind::Dataset, &Self::REQUIRED);
        entity.set(INTERNAL_NAME, internal_name);
        entity.set(DATASET, dataset);
        if !display_name.is_empty() {
            entity.set(DISPLAY_NAME, display_name);
        }
        entity.validate_required()?;

        Ok(Self::from_parts(entity, LoadState::Loaded))
    }

    /// Wrap a dataset entity read from a document.
    pub fn from_entity(entity: ConfigurationEntity, state: LoadState) -> ConfigurationResult<Self> {
        let mut adopted =
            ConfigurationEntity::from_attributes(EntityKind::Dataset, entity.attributes().clone());
        for key in Self::REQUIRED {
            adopted.require(key);
        }
        adopted.validate_required()?;
        Ok(Self::from_parts(adopted, state))
    }

    fn from_parts(entity: ConfigurationEntity, state: LoadState) -> Self {
        Self {
            entity,
            owner: None,
            state,
            filter_pages: Vec::new(),
            attribute_pages: Vec::new(),
            exportables: Vec::new(),
            importables: Vec::new(),
            dynamic_datasets: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &str {
        self.entity.get_attribute(DATASET).unwrap_or_default()
    }

    pub fn internal_name(&self) -> &str {
        self.entity.get_attribute(INTERNAL_NAME).unwrap_or_default()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.entity.display_name()
    }

    /// Name of the template this config was derived from, if any.
    pub fn template(&self) -> Option<&str> {
        self.entity.get_attribute(TEMPLATE)
    }

    /// `false` only when the `visible` flag is explicitly off.
    pub fn is_visible(&self) -> bool {
        !matches!(
            self.entity.get_attribute(VISIBLE).map(str::trim),
            Some("0") | Some("false")
        )
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Name of the adaptor that owns this config.
    pub fn adaptor(&self) -> Option<&str> {
        self.owner.as_ref().map(|owner| owner.name.as_str())
    }

    /// Identity of the adaptor that owns this config.
    pub fn owner_id(&self) -> Option<AdaptorId> {
        self.owner.as_ref().map(|owner| owner.id)
    }

    /// `true` when the adaptor identified by `id` owns this config.
    pub fn is_owned_by(&self, id: AdaptorId) -> bool {
        self.owner_id() == Some(id)
    }

    /// Hand the config to the adaptor with identity `id` and name `name`.
    pub fn with_owner(mut self, id: AdaptorId, name: impl Into<String>) -> Self {
        self.set_owner(id, name);
        self
    }

    pub fn set_owner(&mut self, id: AdaptorId, name: impl Into<String>) {
        self.owner = Some(Owner {
            id,
            name: name.into(),
        });
    }

    pub fn filter_pages(&self) -> &[FilterPage] {
        &self.filter_pages
    }

    pub fn attribute_pages(&self) -> &[AttributePage] {
        &self.attribute_pages
    }

    pub fn exportables(&self) -> &[LinkDescription] {
        &self.exportables
    }

    pub fn importables(&self) -> &[LinkDescription] {
        &self.importables
    }

    pub fn dynamic_datasets(&self) -> &[DynamicDataset] {
        &self.dynamic_datasets
    }

    pub fn dynamic_dataset(&self, internal_name: &str) -> Option<&DynamicDataset> {
        self.dynamic_datasets
            .iter()
            .find(|d| d.internal_name() == Some(internal_name))
    }

    pub fn add_filter_page(&mut self, page: FilterPage) {
        self.filter_pages.push(page);
    }

    pub fn add_attribute_page(&mut self, page: AttributePage) {
        self.attribute_pages.push(page);
    }

    pub fn add_exportable(&mut self, link: LinkDescription) {
        self.exportables.push(link);
    }

    pub fn add_importable(&mut self, link: LinkDescription) {
        self.importables.push(link);
    }

    pub fn add_dynamic_dataset(&mut self, dynamic: DynamicDataset) {
        self.dynamic_datasets.push(dynamic);
    }

    pub fn with_filter_page(mut self, page: FilterPage) -> Self {
        self.add_filter_page(page);
        self
    }

    pub fn with_attribute_page(mut self, page: AttributePage) -> Self {
        self.add_attribute_page(page);
        self
    }

    pub fn with_dynamic_dataset(mut self, dynamic: DynamicDataset) -> Self {
        self.add_dynamic_dataset(dynamic);
        self
    }

    /// `true` when `dataset` and `internal_name` both match.
    pub fn matches_internal_name(&self, dataset: &str, internal_name: &str) -> bool {
        self.dataset() == dataset && self.internal_name() == internal_name
    }

    /// `true` when `dataset` and the display name both match.
    pub fn matches_display_name(&self, dataset: &str, display_name: &str) -> bool {
        self.dataset() == dataset && self.display_name() == Some(display_name)
    }

    /// A copy carrying only the dataset-level attributes, in the
    /// `Unloaded` state.
    pub fn shallow_copy(&self) -> Self {
        let mut copy = Self::from_parts(self.entity.clone(), LoadState::Unloaded);
        copy.owner = self.owner.clone();
        copy
    }

    /// Complete an unloaded config with the deep structure of `source`.
    ///
    /// The dataset-level attributes of `self` are kept. A config that is
    /// already loaded is returned unchanged.
    pub fn populate_from(mut self, source: DatasetConfig) -> Self {
        if self.is_loaded() {
            return self;
        }

        self.filter_pages = source.filter_pages;
        self.attribute_pages = source.attribute_pages;
        self.exportables = source.exportables;
        self.importables = source.importables;
        self.dynamic_datasets = source.dynamic_datasets;
        self.state = LoadState::Loaded;
        self
    }

    /// Mark the config as carrying its full structure.
    pub fn into_loaded(mut self) -> Self {
        self.state = LoadState::Loaded;
        self
    }

    /// Drop hidden pages, collections and descriptions.
    pub fn without_hidden(mut self) -> Self {
        self.filter_pages = self
            .filter_pages
            .into_iter()
            .filter(|p| !p.is_hidden())
            .map(FilterPage::without_hidden)
            .collect();
        self.attribute_pages = self
            .attribute_pages
            .into_iter()
            .filter(|p| !p.is_hidden())
            .map(AttributePage::without_hidden)
            .collect();
        self
    }

    pub fn fingerprint(&self) -> u64 {
        self.entity.fingerprint()
    }

    /// Ordering used for listings: dataset, then internal name.
    pub fn display_order(&self, other: &Self) -> Ordering {
        self.dataset()
            .cmp(other.dataset())
            .then_with(|| self.entity.display_order(&other.entity))
    }
}

impl PartialEq for DatasetConfig {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
            && self.state == other.state
            && self.filter_pages == other.filter_pages
            && self.attribute_pages == other.attribute_pages
            && self.exportables == other.exportables
            && self.importables == other.importables
            && self.dynamic_datasets == other.dynamic_datasets
    }
}

impl Eq for DatasetConfig {}

impl Entity for DatasetConfig {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    /// Broken when a required field is missing or any page is broken.
    /// Unloaded configs are judged on their dataset-level attributes only.
    fn is_broken(&self) -> bool {
        !self.entity.has_required_fields()
            || self.filter_pages.iter().any(|p| p.is_broken())
            || self.attribute_pages.iter().any(|p| p.is_broken())
    }
}

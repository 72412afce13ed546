//! Typed configuration entities: attributes, filters, links and the
//! collection/page containers that group them.

use crate::entity::{ConfigurationEntity, Entity, EntityKind, DISPLAY_NAME, INTERNAL_NAME};
use crate::errors::{ConfigurationError, ConfigurationResult};

#[cfg(test)]
#[path = "descriptions_tests.rs"]
mod tests;

pub const FIELD: &str = "field";
pub const TABLE_CONSTRAINT: &str = "tableConstraint";
pub const KEY: &str = "key";
pub const FILTER_TYPE: &str = "type";
pub const POINTER_DATASET: &str = "pointerDataset";
pub const POINTER_ATTRIBUTE: &str = "pointerAttribute";
pub const POINTER_FILTER: &str = "pointerFilter";
pub const LINK_NAME: &str = "linkName";
pub const LINK_VERSION: &str = "linkVersion";
pub const LINK_ATTRIBUTES: &str = "attributes";
pub const LINK_FILTERS: &str = "filters";

/// A leaf description that can be grouped into collections and pages.
pub trait Description: Entity + Clone + PartialEq {
    const KIND: EntityKind;
    const COLLECTION_KIND: EntityKind;
    const PAGE_KIND: EntityKind;

    /// Wrap an entity read from a document without validating it.
    fn from_entity(entity: ConfigurationEntity) -> Self;
}

fn non_blank(entity: &str, field: &str, value: &str) -> ConfigurationResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigurationError::RequiredFieldMissing {
            entity: entity.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

fn has_value(entity: &ConfigurationEntity, key: &str) -> bool {
    entity
        .get_attribute(key)
        .is_some_and(|value| !value.trim().is_empty())
}

fn adopt(kind: EntityKind, entity: ConfigurationEntity, required: &[&str]) -> ConfigurationEntity {
    let mut adopted = ConfigurationEntity::from_attributes(kind, entity.attributes().clone());
    for key in required {
        adopted.require(key);
    }
    adopted
}

/// An attribute a query can return.
///
/// Requires an internal name, a field and a table constraint. A pointer
/// attribute borrows its definition from another dataset and is complete
/// with just `pointerDataset` and `pointerAttribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescription {
    entity: ConfigurationEntity,
}

impl AttributeDescription {
    const REQUIRED: [&'static str; 3] = [INTERNAL_NAME, FIELD, TABLE_CONSTRAINT];

    pub fn new(
        internal_name: &str,
        field: &str,
        table_constraint: &str,
    ) -> ConfigurationResult<Self> {
        non_blank("attribute", INTERNAL_NAME, internal_name)?;
        non_blank("attribute", FIELD, field)?;
        non_blank("attribute", TABLE_CONSTRAINT, table_constraint)?;

        let mut entity = ConfigurationEntity::with_required(EntityKind::Attribute, &Self::REQUIRED);
        entity.set(INTERNAL_NAME, internal_name);
        entity.set(FIELD, field);
        entity.set(TABLE_CONSTRAINT, table_constraint);
        Ok(Self { entity })
    }

    /// Create an attribute that points at an attribute of another dataset.
    pub fn pointer(
        internal_name: &str,
        pointer_dataset: &str,
        pointer_attribute: &str,
    ) -> ConfigurationResult<Self> {
        non_blank("attribute", INTERNAL_NAME, internal_name)?;
        non_blank("attribute", POINTER_DATASET, pointer_dataset)?;
        non_blank("attribute", POINTER_ATTRIBUTE, pointer_attribute)?;

        let mut entity = ConfigurationEntity::with_required(EntityKind::Attribute, &Self::REQUIRED);
        entity.set(INTERNAL_NAME, internal_name);
        entity.set(POINTER_DATASET, pointer_dataset);
        entity.set(POINTER_ATTRIBUTE, pointer_attribute);
        Ok(Self { entity })
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.entity.set(DISPLAY_NAME, display_name);
        self
    }

    pub fn field(&self) -> Option<&str> {
        self.entity.get_attribute(FIELD)
    }

    pub fn table_constraint(&self) -> Option<&str> {
        self.entity.get_attribute(TABLE_CONSTRAINT)
    }

    pub fn key(&self) -> Option<&str> {
        self.entity.get_attribute(KEY)
    }

    pub fn is_pointer(&self) -> bool {
        has_value(&self.entity, POINTER_DATASET) && has_value(&self.entity, POINTER_ATTRIBUTE)
    }
}

impl Entity for AttributeDescription {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    fn is_broken(&self) -> bool {
        if !has_value(&self.entity, INTERNAL_NAME) {
            return true;
        }
        if self.is_pointer() {
            return false;
        }
        !self.entity.has_required_fields()
    }
}

impl Description for AttributeDescription {
    const KIND: EntityKind = EntityKind::Attribute;
    const COLLECTION_KIND: EntityKind = EntityKind::AttributeCollection;
    const PAGE_KIND: EntityKind = EntityKind::AttributePage;

    fn from_entity(entity: ConfigurationEntity) -> Self {
        Self {
            entity: adopt(Self::KIND, entity, &Self::REQUIRED),
        }
    }
}

/// A filter a query can apply.
///
/// Requires an internal name, field, table constraint and filter type. A
/// pointer filter (`pointerDataset` + `pointerFilter`) is exempt from the
/// last three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescription {
    entity: ConfigurationEntity,
}

impl FilterDescription {
    const REQUIRED: [&'static str; 4] = [INTERNAL_NAME, FIELD, TABLE_CONSTRAINT, FILTER_TYPE];

    pub fn new(
        internal_name: &str,
        field: &str,
        table_constraint: &str,
        filter_type: &str,
    ) -> ConfigurationResult<Self> {
        non_blank("filter", INTERNAL_NAME, internal_name)?;
        non_blank("filter", FIELD, field)?;
        non_blank("filter", TABLE_CONSTRAINT, table_constraint)?;
        non_blank("filter", FILTER_TYPE, filter_type)?;

        let mut entity = ConfigurationEntity::with_required(EntityKind::Filter, &Self::REQUIRED);
        entity.set(INTERNAL_NAME, internal_name);
        entity.set(FIELD, field);
        entity.set(TABLE_CONSTRAINT, table_constraint);
        entity.set(FILTER_TYPE, filter_type);
        Ok(Self { entity })
    }

    pub fn pointer(
        internal_name: &str,
        pointer_dataset: &str,
        pointer_filter: &str,
    ) -> ConfigurationResult<Self> {
        non_blank("filter", INTERNAL_NAME, internal_name)?;
        non_blank("filter", POINTER_DATASET, pointer_dataset)?;
        non_blank("filter", POINTER_FILTER, pointer_filter)?;

        let mut entity = ConfigurationEntity::with_required(EntityKind::Filter, &Self::REQUIRED);
        entity.set(INTERNAL_NAME, internal_name);
        entity.set(POINTER_DATASET, pointer_dataset);
        entity.set(POINTER_FILTER, pointer_filter);
        Ok(Self { entity })
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.entity.set(DISPLAY_NAME, display_name);
        self
    }

    pub fn field(&self) -> Option<&str> {
        self.entity.get_attribute(FIELD)
    }

    pub fn table_constraint(&self) -> Option<&str> {
        self.entity.get_attribute(TABLE_CONSTRAINT)
    }

    pub fn filter_type(&self) -> Option<&str> {
        self.entity.get_attribute(FILTER_TYPE)
    }

    pub fn is_pointer(&self) -> bool {
        has_value(&self.entity, POINTER_DATASET) && has_value(&self.entity, POINTER_FILTER)
    }
}

impl Entity for FilterDescription {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    fn is_broken(&self) -> bool {
        if !has_value(&self.entity, INTERNAL_NAME) {
            return true;
        }
        if self.is_pointer() {
            return false;
        }
        !self.entity.has_required_fields()
    }
}

impl Description for FilterDescription {
    const KIND: EntityKind = EntityKind::Filter;
    const COLLECTION_KIND: EntityKind = EntityKind::FilterCollection;
    const PAGE_KIND: EntityKind = EntityKind::FilterPage;

    fn from_entity(entity: ConfigurationEntity) -> Self {
        Self {
            entity: adopt(Self::KIND, entity, &Self::REQUIRED),
        }
    }
}

/// Direction of a dataset link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Publishes attributes other datasets can join on.
    Exportable,
    /// Accepts a link through a set of filters.
    Importable,
}

impl LinkKind {
    fn entity_kind(&self) -> EntityKind {
        match self {
            LinkKind::Exportable => EntityKind::Exportable,
            LinkKind::Importable => EntityKind::Importable,
        }
    }

    fn references_key(&self) -> &'static str {
        match self {
            LinkKind::Exportable => LINK_ATTRIBUTES,
            LinkKind::Importable => LINK_FILTERS,
        }
    }
}

/// An exportable or importable link between datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescription {
    link_kind: LinkKind,
    entity: ConfigurationEntity,
}

impl LinkDescription {
    /// Create a link; the link name is mandatory.
    ///
    /// `references` names the attributes (exportable) or filters
    /// (importable) that make up the link.
    pub fn new(kind: LinkKind, link_name: &str, references: &[&str]) -> ConfigurationResult<Self> {
        non_blank(kind.entity_kind().element_name(), LINK_NAME, link_name)?;

        let mut entity = ConfigurationEntity::with_required(kind.entity_kind(), &[LINK_NAME]);
        entity.set(LINK_NAME, link_name);
        entity.set(kind.references_key(), references.join(","));
        Ok(Self {
            link_kind: kind,
            entity,
        })
    }

    /// Wrap a document entity; fails when the link name is missing.
    pub fn from_entity(kind: LinkKind, entity: ConfigurationEntity) -> ConfigurationResult<Self> {
        let entity = adopt(kind.entity_kind(), entity, &[LINK_NAME]);
        entity.validate_required()?;
        Ok(Self {
            link_kind: kind,
            entity,
        })
    }

    pub fn link_kind(&self) -> LinkKind {
        self.link_kind
    }

    pub fn link_name(&self) -> Option<&str> {
        self.entity.get_attribute(LINK_NAME)
    }

    pub fn link_version(&self) -> Option<&str> {
        self.entity.get_attribute(LINK_VERSION)
    }

    pub fn references(&self) -> Vec<&str> {
        self.entity
            .get_attribute(self.link_kind.references_key())
            .map(|refs| {
                refs.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Entity for LinkDescription {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    fn is_broken(&self) -> bool {
        !self.entity.has_required_fields() || self.references().is_empty()
    }
}

/// A named group of descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<D> {
    entity: ConfigurationEntity,
    descriptions: Vec<D>,
}

impl<D: Description> Collection<D> {
    pub fn new(internal_name: &str) -> ConfigurationResult<Self> {
        non_blank(D::COLLECTION_KIND.element_name(), INTERNAL_NAME, internal_name)?;
        let mut entity = ConfigurationEntity::with_required(D::COLLECTION_KIND, &[INTERNAL_NAME]);
        entity.set(INTERNAL_NAME, internal_name);
        Ok(Self {
            entity,
            descriptions: Vec::new(),
        })
    }

    pub fn from_entity(entity: ConfigurationEntity) -> Self {
        Self {
            entity: adopt(D::COLLECTION_KIND, entity, &[INTERNAL_NAME]),
            descriptions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: D) -> Self {
        self.descriptions.push(description);
        self
    }

    pub fn push(&mut self, description: D) {
        self.descriptions.push(description);
    }

    pub fn descriptions(&self) -> &[D] {
        &self.descriptions
    }

    pub fn descriptions_mut(&mut self) -> &mut Vec<D> {
        &mut self.descriptions
    }

    pub fn description(&self, internal_name: &str) -> Option<&D> {
        self.descriptions
            .iter()
            .find(|d| d.internal_name() == Some(internal_name))
    }

    /// Drop hidden descriptions.
    pub fn without_hidden(mut self) -> Self {
        self.descriptions.retain(|d| !d.is_hidden());
        self
    }
}

impl<D: Description> Entity for Collection<D> {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    /// Broken when it has descriptions and all of them are broken.
    fn is_broken(&self) -> bool {
        !self.entity.has_required_fields()
            || (!self.descriptions.is_empty() && self.descriptions.iter().all(|d| d.is_broken()))
    }
}

/// A page of collections as presented to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<D> {
    entity: ConfigurationEntity,
    collections: Vec<Collection<D>>,
}

impl<D: Description> Page<D> {
    pub fn new(internal_name: &str) -> ConfigurationResult<Self> {
        non_blank(D::PAGE_KIND.element_name(), INTERNAL_NAME, internal_name)?;
        let mut entity = ConfigurationEntity::with_required(D::PAGE_KIND, &[INTERNAL_NAME]);
        entity.set(INTERNAL_NAME, internal_name);
        Ok(Self {
            entity,
            collections: Vec::new(),
        })
    }

    pub fn from_entity(entity: ConfigurationEntity) -> Self {
        Self {
            entity: adopt(D::PAGE_KIND, entity, &[INTERNAL_NAME]),
            collections: Vec::new(),
        }
    }

    pub fn with_collection(mut self, collection: Collection<D>) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn push(&mut self, collection: Collection<D>) {
        self.collections.push(collection);
    }

    pub fn collections(&self) -> &[Collection<D>] {
        &self.collections
    }

    pub fn collections_mut(&mut self) -> &mut Vec<Collection<D>> {
        &mut self.collections
    }

    pub fn collection(&self, internal_name: &str) -> Option<&Collection<D>> {
        self.collections
            .iter()
            .find(|c| c.internal_name() == Some(internal_name))
    }

    /// Every description on the page, in page order.
    pub fn descriptions(&self) -> impl Iterator<Item = &D> {
        self.collections.iter().flat_map(|c| c.descriptions().iter())
    }

    pub fn without_hidden(mut self) -> Self {
        self.collections.retain(|c| !c.is_hidden());
        self.collections = self
            .collections
            .into_iter()
            .map(Collection::without_hidden)
            .collect();
        self
    }
}

impl<D: Description> Entity for Page<D> {
    fn entity(&self) -> &ConfigurationEntity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut ConfigurationEntity {
        &mut self.entity
    }

    fn is_broken(&self) -> bool {
        !self.entity.has_required_fields()
            || (!self.collections.is_empty() && self.collections.iter().all(|c| c.is_broken()))
    }
}

pub type FilterCollection = Collection<FilterDescription>;
pub type FilterPage = Page<FilterDescription>;
pub type AttributeCollection = Collection<AttributeDescription>;
pub type AttributePage = Page<AttributeDescription>;


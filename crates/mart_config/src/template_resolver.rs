//! Alias substitution for dataset templates.
//!
//! A template dataset config describes many concrete datasets at once. Its
//! attribute values may contain wildcard tokens such as `*species*`, and
//! each dynamic dataset carries an alias list (`species=hsapiens,...`) that
//! says what those tokens become for that dataset.
//!
//! # Examples
//!
//! ```
//! use mart_config::{AliasTable, ConfigurationEntity, EntityKind, TemplateResolver};
//!
//! let mut from = ConfigurationEntity::new(EntityKind::Attribute);
//! from.set("description", "Gene *species* browser");
//!
//! let mut to = ConfigurationEntity::new(EntityKind::Attribute);
//! TemplateResolver::new().resolve_attributes(&mut to, &from, &AliasTable::parse("species=human"));
//!
//! assert_eq!(to.get_attribute("description"), Some("Gene human browser"));
//! ```

use crate::dataset_config::{DatasetConfig, DynamicDataset, LoadState, ALIASES, DATASET, TEMPLATE};
use crate::descriptions::{Collection, Description, LinkDescription, Page};
use crate::entity::{ConfigurationEntity, Entity, EntityKind, INTERNAL_NAME};
use crate::errors::{ConfigurationError, ConfigurationResult};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, instrument};

#[cfg(test)]
#[path = "template_resolver_tests.rs"]
mod tests;

fn wildcard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*[^*]+\*").expect("wildcard pattern is valid"))
}

/// One entry of an alias list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Token name, without the surrounding `*`.
    pub key: String,
    /// Replacement text; `None` removes the token.
    pub replacement: Option<String>,
}

/// Parsed alias list of a dynamic dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: Vec<Alias>,
}

impl AliasTable {
    /// Parse a comma-separated list of `key=value` pairs and bare keys.
    ///
    /// Whitespace around entries is ignored and empty entries are skipped.
    /// A value may itself contain `=`; only the first one splits.
    pub fn parse(text: &str) -> Self {
        let aliases = text
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match entry.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    (!key.is_empty()).then(|| Alias {
                        key: key.to_string(),
                        replacement: Some(value.trim().to_string()),
                    })
                }
                None => Some(Alias {
                    key: entry.to_string(),
                    replacement: None,
                }),
            })
            .collect();

        Self { aliases }
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Replace every `*key*` token in `value`, one alias at a time.
    ///
    /// Tokens without an alias are left untouched.
    pub fn apply(&self, value: &str) -> String {
        self.aliases.iter().fold(value.to_string(), |acc, alias| {
            let token = format!("*{}*", alias.key);
            acc.replace(&token, alias.replacement.as_deref().unwrap_or_default())
        })
    }
}

/// Resolves templated configuration entities into concrete ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateResolver;

impl TemplateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Merge the attributes of template entity `from` into `to`.
    ///
    /// For every title of `from` except the internal name:
    /// - a blank template value leaves `to`'s value as it is;
    /// - a value with a `*token*` has every aliased token substituted;
    /// - the result overwrites `to`'s value for that title.
    pub fn resolve_attributes(
        &self,
        to: &mut ConfigurationEntity,
        from: &ConfigurationEntity,
        aliases: &AliasTable,
    ) {
        for title in from.titles() {
            if title == INTERNAL_NAME {
                continue;
            }

            let value = match from.get_attribute(title) {
                None | Some("") => continue,
                Some(value) if !aliases.is_empty() && wildcard_pattern().is_match(value) => {
                    aliases.apply(value)
                }
                Some(value) => value.to_string(),
            };

            to.set(title, value);
        }
    }

    /// Build the concrete dataset config for `dataset` from `template`.
    ///
    /// The result starts from the dynamic dataset's own attributes, takes
    /// every non-blank template value with aliases substituted, and has
    /// `dataset` set to the dynamic dataset's name and `template` set to
    /// the template's dataset. It is loaded, unowned and carries no dynamic
    /// datasets of its own.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::TemplateNotLoaded` - the template has no deep structure yet
    /// * `ConfigurationError::UnknownDynamicDataset` - the template does not list `dataset`
    #[instrument(skip(self, template), fields(template = template.dataset()))]
    pub fn specialize(
        &self,
        template: &DatasetConfig,
        dataset: &str,
    ) -> ConfigurationResult<DatasetConfig> {
        if !template.is_loaded() {
            return Err(ConfigurationError::TemplateNotLoaded {
                template: template.dataset().to_string(),
            });
        }

        let dynamic = template.dynamic_dataset(dataset).ok_or_else(|| {
            ConfigurationError::UnknownDynamicDataset {
                template: template.dataset().to_string(),
                dataset: dataset.to_string(),
            }
        })?;
        let aliases = dynamic.aliases();

        let mut root = self.dataset_root(template, dynamic);
        self.resolve_attributes(&mut root, template.entity(), &aliases);
        root.set(DATASET, dataset);
        root.set(TEMPLATE, template.dataset());

        let mut concrete = DatasetConfig::from_entity(root, LoadState::Loaded)?;
        for page in template.filter_pages() {
            concrete.add_filter_page(self.resolve_page(page, &aliases));
        }
        for page in template.attribute_pages() {
            concrete.add_attribute_page(self.resolve_page(page, &aliases));
        }
        for link in template.exportables() {
            concrete.add_exportable(self.resolve_link(link, &aliases)?);
        }
        for link in template.importables() {
            concrete.add_importable(self.resolve_link(link, &aliases)?);
        }

        debug!(
            "Specialized template {} into dataset {} with {} alias(es)",
            template.dataset(),
            dataset,
            aliases.aliases().len()
        );

        Ok(concrete)
    }

    fn dataset_root(&self, template: &DatasetConfig, dynamic: &DynamicDataset) -> ConfigurationEntity {
        let mut root = ConfigurationEntity::new(EntityKind::Dataset);
        root.set(INTERNAL_NAME, template.internal_name());
        for (title, value) in dynamic.entity().attributes().iter() {
            if title == INTERNAL_NAME || title == ALIASES {
                continue;
            }
            root.set_attribute(title, value);
        }
        root
    }

    fn resolve_entity(&self, from: &ConfigurationEntity, aliases: &AliasTable) -> ConfigurationEntity {
        let mut to = ConfigurationEntity::new(from.kind());
        if let Some(internal_name) = from.internal_name() {
            to.set(INTERNAL_NAME, internal_name);
        }
        self.resolve_attributes(&mut to, from, aliases);
        to
    }

    fn resolve_page<D: Description>(&self, page: &Page<D>, aliases: &AliasTable) -> Page<D> {
        let mut resolved = Page::from_entity(self.resolve_entity(page.entity(), aliases));
        for collection in page.collections() {
            let mut resolved_collection =
                Collection::from_entity(self.resolve_entity(collection.entity(), aliases));
            for description in collection.descriptions() {
                resolved_collection
                    .push(D::from_entity(self.resolve_entity(description.entity(), aliases)));
            }
            resolved.push(resolved_collection);
        }
        resolved
    }

    fn resolve_link(
        &self,
        link: &LinkDescription,
        aliases: &AliasTable,
    ) -> ConfigurationResult<LinkDescription> {
        LinkDescription::from_entity(link.link_kind(), self.resolve_entity(link.entity(), aliases))
    }
}

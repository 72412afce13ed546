//! Mart registry documents: named collections of virtual schemas.
//!
//! ```toml
//! name = "ensembl"
//!
//! [[virtual_schema]]
//! name = "default"
//!
//! [[virtual_schema.location]]
//! type = "database"
//! host = "ensembldb.example.org"
//! port = 3306
//! database_type = "mysql"
//! instance_name = "ensembl_mart_110"
//! schema = "ensembl_mart_110"
//! user = "anonymous"
//!
//! [[virtual_schema.location]]
//! type = "url"
//! name = "central"
//! url = "https://www.example.org/registry.toml"
//! ```

use crate::adaptor::DsConfigAdaptor;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::{DatabaseType, MartLocation, RegistryDbLocation, UrlLocation};
use crate::virtual_schema::{VirtualSchema, DEFAULT_VIRTUAL_SCHEMA};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

/// A named collection of virtual schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MartRegistry {
    name: String,
    virtual_schemas: Vec<VirtualSchema>,
}

impl MartRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            virtual_schemas: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn virtual_schemas(&self) -> &[VirtualSchema] {
        &self.virtual_schemas
    }

    pub fn virtual_schema(&self, name: &str) -> Option<&VirtualSchema> {
        self.virtual_schemas.iter().find(|s| s.name() == name)
    }

    /// Every location in schema order.
    pub fn locations(&self) -> impl Iterator<Item = &MartLocation> {
        self.virtual_schemas.iter().flat_map(|s| s.locations().iter())
    }

    /// Add a schema.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidConfiguration` when a schema of
    /// the same name is already registered.
    pub fn add_virtual_schema(&mut self, schema: VirtualSchema) -> ConfigurationResult<()> {
        if self.virtual_schema(schema.name()).is_some() {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "virtual_schema".to_string(),
                reason: format!("Duplicate virtual schema '{}'", schema.name()),
            });
        }
        self.virtual_schemas.push(schema);
        Ok(())
    }

    pub fn with_virtual_schema(mut self, schema: VirtualSchema) -> ConfigurationResult<Self> {
        self.add_virtual_schema(schema)?;
        Ok(self)
    }

    /// Parse a registry document; every location is validated.
    pub fn from_toml(content: &str) -> ConfigurationResult<Self> {
        let document: RegistryDocument =
            toml::from_str(content).map_err(|e| ConfigurationError::ParseError {
                reason: format!("registry document: {}", e),
            })?;

        let mut registry = MartRegistry::new(document.name);
        for schema_document in document.virtual_schema {
            let mut schema =
                VirtualSchema::new(&schema_document.name)?.with_visible(schema_document.visible);
            for location in schema_document.location {
                schema.add_location(location.into_location()?);
            }
            registry.add_virtual_schema(schema)?;
        }

        debug!(
            "Parsed registry '{}' with {} virtual schemas",
            registry.name,
            registry.virtual_schemas.len()
        );
        Ok(registry)
    }

    /// Read a registry document from a file.
    pub fn load(path: &Path) -> ConfigurationResult<Self> {
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

        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> ConfigurationResult<String> {
        let document = RegistryDocument {
            name: self.name.clone(),
            virtual_schema: self
                .virtual_schemas
                .iter()
                .map(|schema| VirtualSchemaDocument {
                    name: schema.name().to_string(),
                    visible: schema.is_visible(),
                    location: schema.locations().iter().map(LocationDocument::from).collect(),
                })
                .collect(),
        };

        toml::to_string(&document).map_err(|e| ConfigurationError::ParseError {
            reason: format!("cannot render registry '{}': {}", self.name, e),
        })
    }

    pub fn save(&self, path: &Path) -> ConfigurationResult<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigurationError::FileAccessError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Assemble a registry from the locations an adaptor exports.
    ///
    /// Each composite child becomes a virtual schema named after it; leaf
    /// children (or a leaf root) contribute to the default schema.
    ///
    /// # Errors
    ///
    /// Propagates the first `mart_locations` failure, e.g.
    /// `ConfigurationError::NoLocationBacking` for an in-memory leaf.
    #[instrument(skip(adaptor), fields(adaptor = %adaptor.name()))]
    pub async fn from_adaptor(
        name: &str,
        adaptor: &dyn DsConfigAdaptor,
    ) -> ConfigurationResult<Self> {
        let mut registry = MartRegistry::new(name);
        let mut default_schema = VirtualSchema::new(DEFAULT_VIRTUAL_SCHEMA)?;

        if !adaptor.is_composite() {
            for location in adaptor.mart_locations().await? {
                default_schema.add_location(location);
            }
        } else {
            for child in adaptor.child_adaptors() {
                let locations = child.mart_locations().await?;
                if child.is_composite() {
                    let mut schema = VirtualSchema::new(child.name())?;
                    for location in locations {
                        schema.add_location(location);
                    }
                    registry.add_virtual_schema(schema)?;
                } else {
                    for location in locations {
                        default_schema.add_location(location);
                    }
                }
            }
        }

        if !default_schema.is_empty() {
            match registry
                .virtual_schemas
                .iter_mut()
                .find(|s| s.name() == DEFAULT_VIRTUAL_SCHEMA)
            {
                Some(existing) => {
                    for location in default_schema.locations() {
                        existing.add_location(location.clone());
                    }
                }
                None => registry.virtual_schemas.insert(0, default_schema),
            }
        }

        info!(
            "Assembled registry '{}' with {} locations",
            registry.name,
            registry.locations().count()
        );
        Ok(registry)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    virtual_schema: Vec<VirtualSchemaDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VirtualSchemaDocument {
    name: String,
    #[serde(default = "visible_default")]
    visible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    location: Vec<LocationDocument>,
}

fn visible_default() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LocationDocument {
    Database(DatabaseLocationDocument),
    Url(UrlLocationDocument),
}

#[derive(Debug, Serialize, Deserialize)]
struct DatabaseLocationDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_type: Option<DatabaseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    driver: Option<String>,
    instance_name: String,
    schema: String,
    user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default = "visible_default")]
    visible: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct UrlLocationDocument {
    name: String,
    url: String,
    #[serde(default = "visible_default")]
    visible: bool,
}

impl LocationDocument {
    fn into_location(self) -> ConfigurationResult<MartLocation> {
        match self {
            LocationDocument::Database(doc) => {
                let mut location =
                    RegistryDbLocation::new(&doc.host, &doc.user, &doc.instance_name, &doc.schema)?
                        .with_visible(doc.visible);
                if let Some(name) = doc.name {
                    location.set_name(name);
                }
                if let Some(port) = doc.port {
                    location = location.with_port(port);
                }
                if let Some(database_type) = doc.database_type {
                    location = location.with_database_type(database_type);
                }
                if let Some(driver) = doc.driver {
                    location = location.with_driver(driver);
                }
                location.set_password(doc.password);
                Ok(location.into())
            }
            LocationDocument::Url(doc) => {
                Ok(UrlLocation::new(&doc.name, &doc.url)?.with_visible(doc.visible).into())
            }
        }
    }
}

impl From<&MartLocation> for LocationDocument {
    fn from(location: &MartLocation) -> Self {
        match location {
            MartLocation::Database(db) => LocationDocument::Database(DatabaseLocationDocument {
                name: db.explicit_name().map(str::to_string),
                host: db.host().to_string(),
                port: db.port(),
                database_type: db.database_type().cloned(),
                driver: db.driver().map(str::to_string),
                instance_name: db.instance_name().to_string(),
                schema: db.schema().to_string(),
                user: db.user().to_string(),
                password: db.password().map(str::to_string),
                visible: db.is_visible(),
            }),
            MartLocation::Url(url) => LocationDocument::Url(UrlLocationDocument {
                name: url.name().to_string(),
                url: url.url().to_string(),
                visible: url.is_visible(),
            }),
        }
    }
}

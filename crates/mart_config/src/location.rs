//! Location descriptors: where a mart's data and configuration live.
//!
//! A [`MartLocation`] is either a database (`RegistryDbLocation`) or a
//! URL (`UrlLocation`) pointing at a registry or configuration document.
//! Database locations resolve into [`ConnectionParameters`] for an
//! external connection pool, validating eagerly by opening one connection
//! through a [`ConnectionProbe`].

use crate::attributes::AttributeStore;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::settings::ConnectionDefaults;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use url::Url;

#[cfg(test)]
#[path = "location_tests.rs"]
mod tests;

/// Supported database flavours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DatabaseType {
    MySql,
    Postgres,
    Oracle,
    /// Any other type; its name doubles as the connection scheme and driver.
    Other(String),
}

impl DatabaseType {
    pub fn default_driver(&self) -> &str {
        match self {
            DatabaseType::MySql => "mysql",
            DatabaseType::Postgres => "postgresql",
            DatabaseType::Oracle => "oracle",
            DatabaseType::Other(name) => name,
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseType::MySql => Some(3306),
            DatabaseType::Postgres => Some(5432),
            DatabaseType::Oracle => Some(1521),
            DatabaseType::Other(_) => None,
        }
    }

    fn scheme(&self) -> &str {
        match self {
            DatabaseType::MySql => "mysql",
            DatabaseType::Postgres => "postgresql",
            DatabaseType::Oracle => "oracle",
            DatabaseType::Other(name) => name,
        }
    }

    /// Connection string for a database instance.
    pub fn connection_string(&self, host: &str, port: u16, instance_name: &str) -> String {
        format!("{}://{}:{}/{}", self.scheme(), host, port, instance_name)
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::MySql => write!(f, "mysql"),
            DatabaseType::Postgres => write!(f, "postgres"),
            DatabaseType::Oracle => write!(f, "oracle"),
            DatabaseType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for DatabaseType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "" => Err(ConfigurationError::InvalidConfiguration {
                field: "database_type".to_string(),
                reason: "Database type cannot be empty".to_string(),
            }),
            "mysql" => Ok(DatabaseType::MySql),
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            "oracle" => Ok(DatabaseType::Oracle),
            _ => Ok(DatabaseType::Other(name)),
        }
    }
}

impl TryFrom<String> for DatabaseType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatabaseType> for String {
    fn from(value: DatabaseType) -> Self {
        value.to_string()
    }
}

/// Everything an external connection pool needs to reach a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub database_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub instance_name: String,
    pub schema: String,
    pub user: String,
    pub password: Option<String>,
    pub driver: Option<String>,
    pub pool_size: u32,
    pub display_name: String,
    pub connection_string: String,
}

/// Opens a single connection to validate connection parameters.
///
/// Implemented by the connection-pool collaborator. Implementations must
/// be `Send + Sync`.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Open and immediately release one connection.
    async fn open(&self, parameters: &ConnectionParameters) -> ConfigurationResult<()>;
}

/// A mart hosted in a relational database.
///
/// Host, user, instance name and schema are mandatory and validated on
/// construction. When no explicit name is set, [`name`](Self::name) is
/// derived from host, port, instance, schema and user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDbLocation {
    name: Option<String>,
    host: String,
    port: Option<u16>,
    database_type: Option<DatabaseType>,
    driver: Option<String>,
    instance_name: String,
    schema: String,
    user: String,
    password: Option<String>,
    visible: bool,
}

impl RegistryDbLocation {
    /// Create a database location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::RequiredFieldMissing` for the first of
    /// host, user, instance name or schema that is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use mart_config::RegistryDbLocation;
    ///
    /// let location = RegistryDbLocation::new("db.example.org", "anonymous", "mart_110", "mart_110")?
    ///     .with_port(3306);
    /// assert_eq!(location.name(), "anonymous@db.example.org:3306/mart_110/mart_110");
    ///
    /// assert!(RegistryDbLocation::new("db.example.org", "anonymous", "mart_110", "").is_err());
    /// # Ok::<(), mart_config::ConfigurationError>(())
    /// ```
    pub fn new(
        host: &str,
        user: &str,
        instance_name: &str,
        schema: &str,
    ) -> ConfigurationResult<Self> {
        for (field, value) in [
            ("host", host),
            ("user", user),
            ("instance_name", instance_name),
            ("schema", schema),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::RequiredFieldMissing {
                    entity: "database location".to_string(),
                    field: field.to_string(),
                });
            }
        }

        Ok(Self {
            name: None,
            host: host.to_string(),
            port: None,
            database_type: None,
            driver: None,
            instance_name: instance_name.to_string(),
            schema: schema.to_string(),
            user: user.to_string(),
            password: None,
            visible: true,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_database_type(mut self, database_type: DatabaseType) -> Self {
        self.database_type = Some(database_type);
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set an explicit name; a blank name falls back to the derived one.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.name = (!name.trim().is_empty()).then_some(name);
    }

    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Explicit name, or the derived default.
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.default_name())
    }

    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `user@host[:port]/instance/schema`
    pub fn default_name(&self) -> String {
        let port = self.port.map(|p| format!(":{}", p)).unwrap_or_default();
        format!(
            "{}@{}{}/{}/{}",
            self.user, self.host, port, self.instance_name, self.schema
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn database_type(&self) -> Option<&DatabaseType> {
        self.database_type.as_ref()
    }

    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Build connection parameters without validating them.
    ///
    /// When both database type and driver are unset the defaults apply to
    /// both; otherwise explicit settings are kept as given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidConfiguration` when a driver is
    /// given without a database type, or when no port is set and the
    /// database type has no default port.
    pub fn connection_parameters(
        &self,
        defaults: &ConnectionDefaults,
    ) -> ConfigurationResult<ConnectionParameters> {
        let (database_type, driver) = match (&self.database_type, &self.driver) {
            (None, None) => (defaults.database_type.clone(), Some(defaults.driver())),
            (Some(database_type), driver) => (database_type.clone(), driver.clone()),
            (None, Some(driver)) => {
                return Err(ConfigurationError::InvalidConfiguration {
                    field: "database_type".to_string(),
                    reason: format!(
                        "Location '{}' sets driver '{}' without a database type",
                        self.name(),
                        driver
                    ),
                });
            }
        };

        let port = self
            .port
            .or_else(|| database_type.default_port())
            .ok_or_else(|| ConfigurationError::InvalidConfiguration {
                field: "port".to_string(),
                reason: format!(
                    "Location '{}' has no port and database type '{}' has no default",
                    self.name(),
                    database_type
                ),
            })?;

        let connection_string =
            database_type.connection_string(&self.host, port, &self.instance_name);
        let display_name = self
            .name
            .clone()
            .unwrap_or_else(|| connection_string.clone());

        Ok(ConnectionParameters {
            database_type,
            host: self.host.clone(),
            port,
            instance_name: self.instance_name.clone(),
            schema: self.schema.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            driver,
            pool_size: defaults.pool_size,
            display_name,
            connection_string,
        })
    }

    /// Build connection parameters and prove them by opening a connection.
    ///
    /// The probe is bounded by `defaults.timeout()`.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::InvalidConfiguration` - parameters cannot be built
    /// * `ConfigurationError::ConnectionFailed` - the probe failed; wraps its cause
    /// * `ConfigurationError::ConnectionTimeout` - the probe did not finish in time
    #[instrument(skip(self, probe, defaults), fields(location = %self.name()))]
    pub async fn resolve(
        &self,
        probe: &dyn ConnectionProbe,
        defaults: &ConnectionDefaults,
    ) -> ConfigurationResult<ConnectionParameters> {
        let parameters = self.connection_parameters(defaults)?;
        debug!(
            "Validating connection to {} as {}",
            parameters.connection_string, parameters.user
        );

        match tokio::time::timeout(defaults.timeout(), probe.open(&parameters)).await {
            Ok(Ok(())) => {
                info!("Connection to {} validated", parameters.display_name);
                Ok(parameters)
            }
            Ok(Err(e)) => {
                warn!("Connection to {} failed: {}", parameters.display_name, e);
                Err(ConfigurationError::ConnectionFailed {
                    location: self.name(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!(
                    "Connection to {} timed out after {}s",
                    parameters.display_name, defaults.timeout_seconds
                );
                Err(ConfigurationError::ConnectionTimeout {
                    location: self.name(),
                    seconds: defaults.timeout_seconds,
                })
            }
        }
    }

    fn attributes(&self) -> AttributeStore {
        let mut store = AttributeStore::new();
        store.set_attribute("name", self.name.as_deref());
        store.set("host", self.host.as_str());
        store.set_attribute("port", self.port.map(|p| p.to_string()).as_deref());
        store.set_attribute(
            "databaseType",
            self.database_type.as_ref().map(|t| t.to_string()).as_deref(),
        );
        store.set_attribute("driver", self.driver.as_deref());
        store.set("instanceName", self.instance_name.as_str());
        store.set("schema", self.schema.as_str());
        store.set("user", self.user.as_str());
        store.set_attribute("password", self.password.as_deref());
        store.set("visible", self.visible.to_string());
        store
    }
}

/// A registry or configuration document reachable by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlLocation {
    name: String,
    url: Url,
    visible: bool,
}

impl UrlLocation {
    /// # Errors
    ///
    /// * `ConfigurationError::RequiredFieldMissing` - the name is blank
    /// * `ConfigurationError::InvalidConfiguration` - the URL does not parse
    pub fn new(name: &str, url: &str) -> ConfigurationResult<Self> {
        if name.trim().is_empty() {
            return Err(ConfigurationError::RequiredFieldMissing {
                entity: "url location".to_string(),
                field: "name".to_string(),
            });
        }

        let url = Url::parse(url).map_err(|e| ConfigurationError::InvalidConfiguration {
            field: "url".to_string(),
            reason: format!("'{}': {}", url, e),
        })?;

        Ok(Self {
            name: name.to_string(),
            url,
            visible: true,
        })
    }

    pub fn from_url(name: &str, url: Url) -> ConfigurationResult<Self> {
        Self::new(name, url.as_str())
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn attributes(&self) -> AttributeStore {
        let mut store = AttributeStore::new();
        store.set("name", self.name.as_str());
        store.set("url", self.url.as_str());
        store.set("visible", self.visible.to_string());
        store
    }
}

/// Type tag distinguishing location kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Database,
    Url,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::Database => write!(f, "database"),
            LocationKind::Url => write!(f, "url"),
        }
    }
}

/// Where a mart physically lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MartLocation {
    Database(RegistryDbLocation),
    Url(UrlLocation),
}

impl MartLocation {
    pub fn kind(&self) -> LocationKind {
        match self {
            MartLocation::Database(_) => LocationKind::Database,
            MartLocation::Url(_) => LocationKind::Url,
        }
    }

    pub fn name(&self) -> String {
        match self {
            MartLocation::Database(location) => location.name(),
            MartLocation::Url(location) => location.name().to_string(),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            MartLocation::Database(location) => location.is_visible(),
            MartLocation::Url(location) => location.is_visible(),
        }
    }

    /// The location's fields as attributes, in a fixed order.
    pub fn attributes(&self) -> AttributeStore {
        let mut store = match self {
            MartLocation::Database(location) => location.attributes(),
            MartLocation::Url(location) => location.attributes(),
        };
        store.set("type", self.kind().to_string());
        store
    }

    /// Order-independent digest of the location's attribute values.
    pub fn fingerprint(&self) -> u64 {
        self.attributes().fingerprint()
    }
}

impl From<RegistryDbLocation> for MartLocation {
    fn from(location: RegistryDbLocation) -> Self {
        MartLocation::Database(location)
    }
}

impl From<UrlLocation> for MartLocation {
    fn from(location: UrlLocation) -> Self {
        MartLocation::Url(location)
    }
}

//! Metadata configuration for biological data marts.
//!
//! Models the hierarchical dataset configurations (pages, collections,
//! filters, attributes) that tell a query engine how to present and query a
//! mart, the locations those marts live in, and the adaptors that serve
//! configurations from files, databases and registries.
//!
//! # Examples
//!
//! ```
//! use mart_config::{DatasetConfig, DatasetConfigAdaptor, DsConfigAdaptor};
//!
//! # async fn example() -> Result<(), mart_config::ConfigurationError> {
//! let config = DatasetConfig::new("snp", "snp_config", "Variation")?;
//! let adaptor = DatasetConfigAdaptor::new(config);
//!
//! let found = adaptor
//!     .dataset_config_by_internal_name("snp", "snp_config")
//!     .await?;
//! assert!(found.is_some_and(|c| c.is_loaded()));
//! # Ok(())
//! # }
//! ```

pub mod adaptor;
pub mod attributes;
pub mod dataset_config;
pub mod descriptions;
pub mod document;
pub mod entity;
pub mod errors;
pub mod location;
pub mod registry;
pub mod settings;
pub mod template_resolver;
pub mod virtual_schema;

pub use adaptor::{
    leaf_adaptors, AdaptorId, CacheStatistics, CompositeAdaptor, DatabaseAdaptor, DatabaseBackend,
    DatasetConfigAdaptor, DatasetConfigStore, DsConfigAdaptor, FilesystemAdaptor,
    LocationAdaptorFactory, StandardLocationFactory,
};
pub use attributes::{AttributeState, AttributeStore};
pub use dataset_config::{DatasetConfig, DynamicDataset, LoadState};
pub use descriptions::{
    AttributeCollection, AttributeDescription, AttributePage, Collection, Description,
    FilterCollection, FilterDescription, FilterPage, LinkDescription, LinkKind, Page,
};
pub use document::{
    parse_dataset_config, read_dataset_config_file, render_dataset_config,
    write_dataset_config_file,
};
pub use entity::{ConfigurationEntity, Entity, EntityKind};
pub use errors::{ConfigurationError, ConfigurationResult};
pub use location::{
    ConnectionParameters, ConnectionProbe, DatabaseType, LocationKind, MartLocation,
    RegistryDbLocation, UrlLocation,
};
pub use registry::MartRegistry;
pub use settings::{AdaptorSettings, ConnectionDefaults};
pub use template_resolver::{Alias, AliasTable, TemplateResolver};
pub use virtual_schema::VirtualSchema;

//! Named groupings of mart locations.

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::location::MartLocation;

#[cfg(test)]
#[path = "virtual_schema_tests.rs"]
mod tests;

/// Name given to the schema that collects ungrouped locations.
pub const DEFAULT_VIRTUAL_SCHEMA: &str = "default";

/// A named, ordered group of locations.
///
/// Insertion order is kept for display; equality ignores it.
#[derive(Debug, Clone)]
pub struct VirtualSchema {
    name: String,
    locations: Vec<MartLocation>,
    visible: bool,
}

impl VirtualSchema {
    /// # Errors
    ///
    /// Returns `ConfigurationError::RequiredFieldMissing` for a blank name.
    pub fn new(name: &str) -> ConfigurationResult<Self> {
        if name.trim().is_empty() {
            return Err(ConfigurationError::RequiredFieldMissing {
                entity: "virtual schema".to_string(),
                field: "name".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            locations: Vec::new(),
            visible: true,
        })
    }

    pub fn with_location(mut self, location: impl Into<MartLocation>) -> Self {
        self.add_location(location);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn add_location(&mut self, location: impl Into<MartLocation>) {
        self.locations.push(location.into());
    }

    /// Remove and return the first location with the given name.
    pub fn remove_location(&mut self, name: &str) -> Option<MartLocation> {
        let index = self.locations.iter().position(|l| l.name() == name)?;
        Some(self.locations.remove(index))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn locations(&self) -> &[MartLocation] {
        &self.locations
    }

    pub fn location(&self, name: &str) -> Option<&MartLocation> {
        self.locations.iter().find(|l| l.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Sum of member location fingerprints; independent of order.
    pub fn fingerprint(&self) -> u64 {
        self.locations
            .iter()
            .fold(0u64, |sum, l| sum.wrapping_add(l.fingerprint()))
    }
}

impl PartialEq for VirtualSchema {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name
            || self.visible != other.visible
            || self.locations.len() != other.locations.len()
        {
            return false;
        }

        let mut unmatched: Vec<&MartLocation> = other.locations.iter().collect();
        self.locations.iter().all(|location| {
            match unmatched.iter().position(|candidate| *candidate == location) {
                Some(index) => {
                    unmatched.swap_remove(index);
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for VirtualSchema {}

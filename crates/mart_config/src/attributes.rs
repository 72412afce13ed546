//! Ordered attribute storage shared by every configuration entity.
//!
//! An `AttributeStore` remembers every attribute title in the order it was
//! first seen, including titles that were only ever set to "no value". The
//! value map is a subset of the titles: a title without a stored value has
//! been deliberately cleared, while a key that is not a title was never set.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;

/// Presence state of a single attribute key.
///
/// # Examples
///
/// ```
/// use mart_config::{AttributeState, AttributeStore};
///
/// let mut store = AttributeStore::new();
/// store.set("field", "gene_id");
/// store.clear("description");
///
/// assert_eq!(store.state("field"), AttributeState::Set("gene_id"));
/// assert_eq!(store.state("description"), AttributeState::Cleared);
/// assert_eq!(store.state("missing"), AttributeState::NeverSet);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeState<'a> {
    /// The key has never been registered.
    NeverSet,
    /// The key occupies a title slot but holds no value.
    Cleared,
    /// The key holds a value.
    Set(&'a str),
}

/// Ordered mapping from attribute key to string value.
///
/// Equality is structural: two stores are equal when they hold the same
/// values and the same set of titles, regardless of title order. The
/// [`fingerprint`](AttributeStore::fingerprint) is a separate,
/// order-independent digest of the stored values only.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    titles: Vec<String>,
    values: HashMap<String, String>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear an attribute.
    ///
    /// The key is appended to the title order the first time it is seen.
    /// A `None` value removes any stored value but keeps the title slot.
    pub fn set_attribute(&mut self, key: &str, value: Option<&str>) {
        if !self.has_title(key) {
            self.titles.push(key.to_string());
        }

        match value {
            Some(value) => {
                self.values.insert(key.to_string(), value.to_string());
            }
            None => {
                self.values.remove(key);
            }
        }
    }

    /// Store a value under `key`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.set_attribute(key, Some(&value));
    }

    /// Register `key` as a title without a value.
    pub fn clear(&mut self, key: &str) {
        self.set_attribute(key, None);
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn state(&self, key: &str) -> AttributeState<'_> {
        match self.values.get(key) {
            Some(value) => AttributeState::Set(value),
            None if self.has_title(key) => AttributeState::Cleared,
            None => AttributeState::NeverSet,
        }
    }

    /// Attribute titles in first-seen order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn has_title(&self, key: &str) -> bool {
        self.titles.iter().any(|t| t == key)
    }

    /// Position of `key` in the title order.
    pub fn title_index(&self, key: &str) -> Option<usize> {
        self.titles.iter().position(|t| t == key)
    }

    /// Iterate `(title, value)` pairs in title order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.titles
            .iter()
            .map(move |title| (title.as_str(), self.get_attribute(title)))
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Order-independent digest of the stored values.
    ///
    /// Cleared titles do not contribute. Different attribute sets can
    /// produce the same fingerprint, so this is never used for equality.
    pub fn fingerprint(&self) -> u64 {
        self.values.values().fold(0u64, |acc, value| {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        })
    }
}

impl PartialEq for AttributeStore {
    fn eq(&self, other: &Self) -> bool {
        if self.values != other.values || self.titles.len() != other.titles.len() {
            return false;
        }

        let titles: HashSet<&str> = self.titles.iter().map(String::as_str).collect();
        other.titles.iter().all(|t| titles.contains(t.as_str()))
    }
}

impl Eq for AttributeStore {}

impl<K, V> FromIterator<(K, V)> for AttributeStore
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (key, value) in iter {
            store.set(key.as_ref(), value);
        }
        store
    }
}

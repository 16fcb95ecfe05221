//! Ordered, injective rename tables.
//!
//! Both tables serialize as plain JSON objects in insertion order, which is
//! the shape the admin UI renders as its preview table. Injectivity is
//! checked on every insert (and on deserialization), so a value of these
//! types can never hold two keys that share a generated name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("`{0}` is already mapped")]
    DuplicateKey(String),
    #[error("`{value}` is already used by `{existing}`, cannot also map `{key}` to it")]
    DuplicateValue {
        key: String,
        value: String,
        existing: String,
    },
}

/// Insertion-ordered map whose values are as unique as its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct InjectiveMap {
    forward: IndexMap<String, String>,
    inverse: HashMap<String, String>,
}

impl InjectiveMap {
    fn insert(&mut self, key: String, value: String) -> Result<(), MappingError> {
        if self.forward.contains_key(&key) {
            return Err(MappingError::DuplicateKey(key));
        }
        if let Some(existing) = self.inverse.get(&value) {
            return Err(MappingError::DuplicateValue {
                key,
                value,
                existing: existing.clone(),
            });
        }
        self.inverse.insert(value.clone(), key.clone());
        self.forward.insert(key, value);
        Ok(())
    }

    fn from_pairs(pairs: IndexMap<String, String>) -> Result<Self, MappingError> {
        let mut map = InjectiveMap::default();
        for (key, value) in pairs {
            map.insert(key, value)?;
        }
        Ok(map)
    }
}

/// `original_class -> unique_class` for one `(template, site)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct ClassMapping {
    map: InjectiveMap,
}

impl ClassMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        original: impl Into<String>,
        unique: impl Into<String>,
    ) -> Result<(), MappingError> {
        self.map.insert(original.into(), unique.into())
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.map.forward.get(original).map(String::as_str)
    }

    /// Reverse lookup: which original class was renamed to `unique`.
    pub fn original_of(&self, unique: &str) -> Option<&str> {
        self.map.inverse.get(unique).map(String::as_str)
    }

    pub fn contains_unique(&self, unique: &str) -> bool {
        self.map.inverse.contains_key(unique)
    }

    pub fn len(&self) -> usize {
        self.map.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map
            .forward
            .iter()
            .map(|(original, unique)| (original.as_str(), unique.as_str()))
    }

    /// The same table read backwards (`unique_class -> original_class`).
    pub fn inverse(&self) -> ClassMapping {
        let mut inverse = ClassMapping::new();
        for (original, unique) in self.iter() {
            // Injective by construction, so the inverse cannot collide.
            let _ = inverse.insert(unique, original);
        }
        inverse
    }
}

impl TryFrom<IndexMap<String, String>> for ClassMapping {
    type Error = MappingError;

    fn try_from(pairs: IndexMap<String, String>) -> Result<Self, Self::Error> {
        Ok(Self {
            map: InjectiveMap::from_pairs(pairs)?,
        })
    }
}

impl Serialize for ClassMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.map.forward.serialize(serializer)
    }
}

/// `synthetic_class -> declaration_block` extracted from inline `style`
/// attributes. Identical declaration blocks share one synthetic class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct StyleMapping {
    map: InjectiveMap,
}

impl StyleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        synthetic: impl Into<String>,
        declarations: impl Into<String>,
    ) -> Result<(), MappingError> {
        self.map.insert(synthetic.into(), declarations.into())
    }

    pub fn declarations(&self, synthetic: &str) -> Option<&str> {
        self.map.forward.get(synthetic).map(String::as_str)
    }

    /// The synthetic class that carries `declarations`, if any.
    pub fn class_for(&self, declarations: &str) -> Option<&str> {
        self.map.inverse.get(declarations).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map
            .forward
            .iter()
            .map(|(class, declarations)| (class.as_str(), declarations.as_str()))
    }
}

impl TryFrom<IndexMap<String, String>> for StyleMapping {
    type Error = MappingError;

    fn try_from(pairs: IndexMap<String, String>) -> Result<Self, Self::Error> {
        Ok(Self {
            map: InjectiveMap::from_pairs(pairs)?,
        })
    }
}

impl Serialize for StyleMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.map.forward.serialize(serializer)
    }
}

//! Entity records, duplicate pairs and feature extraction.
//!
//! An [`EntityRecord`] is a bag of `(name, value)` attributes. Blocking is
//! schema-agnostic: only attribute *values* contribute features, and they are
//! tokenized by lowercasing and splitting on anything that is not alphanumeric.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Zero-based position of an entity within its collection.
pub type EntityId = usize;

/// A single `name = value` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name (not used as a feature).
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// One entity of a source or target collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// External identifier, used to resolve ground-truth pairs.
    #[serde(default)]
    pub url: Option<String>,
    /// Attributes in file order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl EntityRecord {
    /// Create an empty record with an optional url.
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            attributes: Vec::new(),
        }
    }

    /// Build a url-less record whose attributes are the given values.
    ///
    /// Handy for tests and small in-memory datasets.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: None,
            attributes: values
                .into_iter()
                .map(|v| Attribute {
                    name: "value".to_string(),
                    value: v.into(),
                })
                .collect(),
        }
    }

    /// Append an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Distinct tokens over all attribute values (MinHash features).
    pub fn tokens(&self) -> BTreeSet<String> {
        self.raw_tokens().collect()
    }

    /// Token counts over all attribute values (SuperBit features).
    pub fn token_counts(&self) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for tok in self.raw_tokens() {
            *counts.entry(tok).or_insert(0) += 1;
        }
        counts
    }

    /// True if the record yields no tokens at all.
    pub fn is_featureless(&self) -> bool {
        self.raw_tokens().next().is_none()
    }

    fn raw_tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.attributes.iter().flat_map(|a| tokenize(&a.value))
    }
}

fn tokenize(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .map(str::to_lowercase)
}

/// A known true match between `source` and `target` (fixed order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Position in the source collection.
    pub source: EntityId,
    /// Position in the target collection.
    pub target: EntityId,
}

impl DuplicatePair {
    /// Create a pair.
    pub fn new(source: EntityId, target: EntityId) -> Self {
        Self { source, target }
    }
}

/// The set of true duplicate pairs.
pub type GroundTruth = HashSet<DuplicatePair>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercased_and_split_on_punctuation() {
        let e = EntityRecord::new(None)
            .with_attribute("name", "Barack H. Obama")
            .with_attribute("title", "president,USA");
        let toks: Vec<String> = e.tokens().into_iter().collect();
        assert_eq!(toks, vec!["barack", "h", "obama", "president", "usa"]);
    }

    #[test]
    fn attribute_names_are_not_features() {
        let e = EntityRecord::new(None).with_attribute("secret_name", "");
        assert!(e.is_featureless());
        assert!(e.tokens().is_empty());
    }

    #[test]
    fn token_counts_keep_multiplicity() {
        let e = EntityRecord::from_values(["new york", "New-York pizza"]);
        let counts = e.token_counts();
        assert_eq!(counts["new"], 2);
        assert_eq!(counts["york"], 2);
        assert_eq!(counts["pizza"], 1);
    }

    #[test]
    fn unicode_tokens_survive() {
        let e = EntityRecord::from_values(["Zürich Straße"]);
        assert!(e.tokens().contains("zürich"));
        assert!(e.tokens().contains("straße"));
    }

    #[test]
    fn pair_equality_is_ordered() {
        assert_ne!(DuplicatePair::new(0, 1), DuplicatePair::new(1, 0));
        let gt: GroundTruth = [DuplicatePair::new(0, 1), DuplicatePair::new(0, 1)]
            .into_iter()
            .collect();
        assert_eq!(gt.len(), 1);
    }
}

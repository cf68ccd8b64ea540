use serde::Deserialize;
use std::collections::HashMap;

/// Origin reported for foods missing from the origin map
pub const UNKNOWN_ORIGIN: &str = "Unknown";

/// Food names indexed by classifier output position
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Food name to origin lookup, falling back to [`UNKNOWN_ORIGIN`] on a miss
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OriginMap(HashMap<String, String>);

impl OriginMap {
    pub fn new(origins: HashMap<String, String>) -> Self {
        Self(origins)
    }

    pub fn get(&self, food_name: &str) -> &str {
        self.0
            .get(food_name)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ORIGIN)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for OriginMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

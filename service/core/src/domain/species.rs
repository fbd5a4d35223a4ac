// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a catalog species
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SpeciesId(pub Uuid);

impl SpeciesId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SpeciesId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesPhoto {
    pub url: String,
    pub name: Option<String>,
}

/// Reference catalog entry for a catchable species.
///
/// `priority` drives display ordering in clients; higher sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub label: String,
    pub priority: Option<i32>,
    pub photo: Option<SpeciesPhoto>,
}

impl Species {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: SpeciesId::new(),
            label: label.into(),
            priority: None,
            photo: None,
        }
    }
}

/// Species-id to count map carried by weighing payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesCounts(pub BTreeMap<SpeciesId, u32>);

impl SpeciesCounts {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn species_ids(&self) -> Vec<SpeciesId> {
        self.0.keys().copied().collect()
    }

    pub fn get(&self, species: SpeciesId) -> u32 {
        self.0.get(&species).copied().unwrap_or(0)
    }

    /// Add another payload into this one, summing per species.
    pub fn merge(&mut self, other: &SpeciesCounts) {
        for (species, count) in &other.0 {
            *self.0.entry(*species).or_insert(0) += count;
        }
    }
}

impl FromIterator<(SpeciesId, u32)> for SpeciesCounts {
    fn from_iter<I: IntoIterator<Item = (SpeciesId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sums_per_species() {
        let pike = SpeciesId::new();
        let perch = SpeciesId::new();
        let mut total: SpeciesCounts = [(pike, 3), (perch, 1)].into_iter().collect();
        let more: SpeciesCounts = [(pike, 2)].into_iter().collect();
        total.merge(&more);
        assert_eq!(total.get(pike), 5);
        assert_eq!(total.get(perch), 1);
    }

    #[test]
    fn test_counts_serialize_as_plain_map() {
        let species = SpeciesId::new();
        let counts: SpeciesCounts = [(species, 4)].into_iter().collect();
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json[species.to_string()], 4);
    }
}

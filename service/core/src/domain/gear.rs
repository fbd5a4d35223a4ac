// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::scope::OperatorScope;

/// Unique identifier for a physical gear item
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GearId(pub Uuid);

impl GearId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for GearId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GearId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a gear-type catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GearTypeId(pub Uuid);

impl GearTypeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GearTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Regulatory classification of a gear type.
///
/// Nets may be grouped into multi-item deployments; catchers are always
/// deployed alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GearCategory {
    Net,
    Catcher,
}

/// Reference catalog entry for a kind of gear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearType {
    pub id: GearTypeId,
    pub label: String,
    pub category: GearCategory,
}

impl GearType {
    pub fn new(label: impl Into<String>, category: GearCategory) -> Self {
        Self {
            id: GearTypeId::new(),
            label: label.into(),
            category,
        }
    }
}

/// Category-specific calibration data recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GearCalibration {
    Net { net_length_m: u32 },
    Catcher { secondary_eye_size_mm: u32 },
}

impl GearCalibration {
    /// Whether this calibration shape is the one the category requires.
    pub fn matches(&self, category: GearCategory) -> bool {
        matches!(
            (self, category),
            (GearCalibration::Net { .. }, GearCategory::Net)
                | (GearCalibration::Catcher { .. }, GearCategory::Catcher)
        )
    }
}

/// A physical gear item owned by an operator scope.
///
/// The seal number is assigned by the regulator, unique across all
/// non-deleted gear and immutable after registration. Gear is soft-deleted
/// only, and never while it sits in an active deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub id: GearId,
    pub seal_number: String,
    pub gear_type: GearTypeId,
    pub eye_size_mm: u32,
    pub calibration: GearCalibration,
    pub scope: OperatorScope,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Gear {
    pub fn new(
        seal_number: impl Into<String>,
        gear_type: GearTypeId,
        eye_size_mm: u32,
        calibration: GearCalibration,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: GearId::new(),
            seal_number: seal_number.into(),
            gear_type,
            eye_size_mm,
            calibration,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_matches_category() {
        let net = GearCalibration::Net { net_length_m: 60 };
        let catcher = GearCalibration::Catcher {
            secondary_eye_size_mm: 12,
        };
        assert!(net.matches(GearCategory::Net));
        assert!(!net.matches(GearCategory::Catcher));
        assert!(catcher.matches(GearCategory::Catcher));
        assert!(!catcher.matches(GearCategory::Net));
    }
}

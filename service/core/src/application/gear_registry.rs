// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Gear Registry Application Service
//!
//! Owns the physical gear inventory: registration with seal-number
//! uniqueness and category-shaped calibration, deletion guarded against
//! gear that is still in the water, and the catalog reads (gear types,
//! species) the clients drive their pickers from.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::LedgerError;
use crate::domain::gear::{Gear, GearCalibration, GearId, GearType, GearTypeId};
use crate::domain::repository::{
    DeploymentRepository, GearRepository, GearTypeRepository, RepositoryError,
    SpeciesRepository,
};
use crate::domain::scope::OperatorScope;
use crate::domain::species::Species;

/// A gear item plus its live "is it in the water" flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredGear {
    pub gear: Gear,
    pub in_water: bool,
}

pub struct GearRegistry {
    gear: Arc<dyn GearRepository>,
    gear_types: Arc<dyn GearTypeRepository>,
    species: Arc<dyn SpeciesRepository>,
    deployments: Arc<dyn DeploymentRepository>,
}

impl GearRegistry {
    pub fn new(
        gear: Arc<dyn GearRepository>,
        gear_types: Arc<dyn GearTypeRepository>,
        species: Arc<dyn SpeciesRepository>,
        deployments: Arc<dyn DeploymentRepository>,
    ) -> Self {
        Self {
            gear,
            gear_types,
            species,
            deployments,
        }
    }

    /// Register a physical gear item.
    ///
    /// The seal number must be unused across all non-deleted gear, in any
    /// scope, and the calibration shape must match the gear type's category.
    pub async fn register(
        &self,
        scope: &OperatorScope,
        seal_number: String,
        gear_type: GearTypeId,
        eye_size_mm: u32,
        calibration: GearCalibration,
    ) -> Result<Gear, LedgerError> {
        if self.gear.find_by_seal_number(&seal_number).await?.is_some() {
            return Err(LedgerError::SealNumberTaken(seal_number));
        }

        let kind = self
            .gear_types
            .find_by_id(gear_type)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Gear type {}", gear_type)))?;
        if !calibration.matches(kind.category) {
            return Err(LedgerError::CalibrationMismatch {
                expected: kind.category,
            });
        }

        let gear = Gear::new(seal_number, gear_type, eye_size_mm, calibration, scope.clone());
        self.gear.create(&gear).await?;

        info!(%scope, gear = %gear.id, seal = %gear.seal_number, "gear registered");
        Ok(gear)
    }

    /// Soft-delete a gear item. Refused while the item sits in an active
    /// deployment.
    pub async fn remove(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<(), LedgerError> {
        let gear = self
            .gear
            .find_by_id(scope, id)
            .await?
            .ok_or(LedgerError::GearNotFound)?;

        let deployed = self
            .deployments
            .find_active_containing_gear(scope, &[gear.id])
            .await?;
        if !deployed.is_empty() {
            return Err(LedgerError::GearInUse);
        }

        self.gear.soft_delete(scope, id).await?;
        info!(%scope, gear = %id, "gear deleted");
        Ok(())
    }

    /// The scope's gear inventory with in-water flags.
    pub async fn list(
        &self,
        scope: &OperatorScope,
    ) -> Result<Vec<RegisteredGear>, LedgerError> {
        let gear = self.gear.list(scope).await?;
        let active = self.deployments.find_active(scope).await?;
        let in_water: BTreeSet<GearId> = active
            .iter()
            .flat_map(|d| d.gear.iter().copied())
            .collect();

        Ok(gear
            .into_iter()
            .map(|g| {
                let deployed = in_water.contains(&g.id);
                RegisteredGear {
                    gear: g,
                    in_water: deployed,
                }
            })
            .collect())
    }

    /// Gear-type reference catalog.
    pub async fn gear_type_catalog(&self) -> Result<Vec<GearType>, LedgerError> {
        Ok(self.gear_types.list().await?)
    }

    /// Species reference catalog, display priority first, then label.
    pub async fn species_catalog(&self) -> Result<Vec<Species>, LedgerError> {
        let mut species = self.species.list().await?;
        species.sort_by(|a, b| {
            b.priority
                .unwrap_or(i32::MIN)
                .cmp(&a.priority.unwrap_or(i32::MIN))
                .then_with(|| a.label.cmp(&b.label))
        });
        Ok(species)
    }
}

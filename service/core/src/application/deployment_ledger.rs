// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Ledger Application Service
//!
//! Owns the gear-deployment lifecycle (build/remove), gear exclusivity and
//! the multi-gear grouping rules. Each mutating action writes a current-state
//! row and an immutable event; there is no transaction spanning the two, so
//! a failed second write is unwound with a compensating delete and the
//! original error re-raised.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::catch::CatchWeighing;
use crate::domain::deployment::{
    DeploymentEvent, DeploymentEventId, DeploymentEventKind, GearDeployment,
    GearDeploymentId,
};
use crate::domain::error::LedgerError;
use crate::domain::gear::{GearCategory, GearId};
use crate::domain::geo::{Coordinates, GeoProjector, LocationDescriptor};
use crate::domain::repository::{
    CatchWeighingRepository, DeploymentEventRepository, DeploymentRepository,
    GearRepository, GearTypeRepository, RepositoryError, SessionRepository,
};
use crate::domain::scope::OperatorScope;
use crate::domain::session::Session;
use crate::domain::species::SpeciesCounts;

use crate::application::catch_ledger::CatchLedger;

pub struct DeploymentLedger {
    deployments: Arc<dyn DeploymentRepository>,
    deployment_events: Arc<dyn DeploymentEventRepository>,
    gear: Arc<dyn GearRepository>,
    gear_types: Arc<dyn GearTypeRepository>,
    sessions: Arc<dyn SessionRepository>,
    weighings: Arc<dyn CatchWeighingRepository>,
    catch_ledger: Arc<CatchLedger>,
    projector: Arc<dyn GeoProjector>,
}

impl DeploymentLedger {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        deployments: Arc<dyn DeploymentRepository>,
        deployment_events: Arc<dyn DeploymentEventRepository>,
        gear: Arc<dyn GearRepository>,
        gear_types: Arc<dyn GearTypeRepository>,
        sessions: Arc<dyn SessionRepository>,
        weighings: Arc<dyn CatchWeighingRepository>,
        catch_ledger: Arc<CatchLedger>,
        projector: Arc<dyn GeoProjector>,
    ) -> Self {
        Self {
            deployments,
            deployment_events,
            gear,
            gear_types,
            sessions,
            weighings,
            catch_ledger,
            projector,
        }
    }

    /// Put gear into the water.
    ///
    /// Grouping more than one item is a net-specific workflow: all items
    /// must share one gear type and that type's category must be NET. A
    /// catcher is always deployed alone.
    pub async fn build(
        &self,
        scope: &OperatorScope,
        gear_ids: Vec<GearId>,
        coordinates: Coordinates,
        location: Option<LocationDescriptor>,
    ) -> Result<GearDeployment, LedgerError> {
        if gear_ids.is_empty() {
            return Err(LedgerError::NoGearSelected);
        }
        let session = self.active_session(scope).await?;

        let gear = self.gear.find_by_ids(scope, &gear_ids).await?;
        if gear.len() != gear_ids.len() {
            return Err(LedgerError::GearNotFound);
        }

        let in_use = self
            .deployments
            .find_active_containing_gear(scope, &gear_ids)
            .await?;
        if !in_use.is_empty() {
            return Err(LedgerError::GearInUse);
        }

        if gear.len() > 1 {
            let types: BTreeSet<_> = gear.iter().map(|g| g.gear_type.0).collect();
            if types.len() > 1 {
                return Err(LedgerError::TooManyGearTypes);
            }
            let gear_type = self
                .gear_types
                .find_by_id(gear[0].gear_type)
                .await?
                .ok_or_else(|| {
                    RepositoryError::NotFound(format!(
                        "Gear type {}",
                        gear[0].gear_type
                    ))
                })?;
            if gear_type.category != GearCategory::Net {
                return Err(LedgerError::InvalidGearCategory);
            }
        }

        let geom = self.projector.to_storage(coordinates)?;
        // Event id is assigned up front so the deployment row can reference
        // its BUILD event before either write has happened.
        let event_id = DeploymentEventId::new();
        let deployment = GearDeployment::new(gear_ids, event_id, scope.clone());
        let event = DeploymentEvent::build(
            event_id,
            session.id,
            deployment.id,
            geom,
            location,
            scope.clone(),
        );

        self.deployments.create(&deployment).await?;
        if let Err(err) = self.deployment_events.create(&event).await {
            warn!(%scope, deployment = %deployment.id, "build event write failed, unwinding deployment row");
            let source = Box::new(LedgerError::from(err));
            return match self.deployments.delete(scope, deployment.id).await {
                Ok(()) => Err(*source),
                Err(cleanup) => Err(LedgerError::RollbackFailed { source, cleanup }),
            };
        }

        info!(%scope, session = %session.id, deployment = %deployment.id, "gear deployed");
        Ok(deployment)
    }

    /// Take a deployment's gear out of the water.
    ///
    /// Removing an already-removed deployment is a no-op returning the
    /// current state, so retries after a lost response are safe.
    pub async fn remove(
        &self,
        scope: &OperatorScope,
        deployment_id: GearDeploymentId,
        coordinates: Coordinates,
        location: Option<LocationDescriptor>,
    ) -> Result<GearDeployment, LedgerError> {
        let mut deployment = self
            .deployments
            .find_by_id(scope, deployment_id)
            .await?
            .ok_or(LedgerError::DeploymentNotFound(deployment_id))?;

        if deployment.remove_event.is_some() {
            return Ok(deployment);
        }

        let session = self.active_session(scope).await?;
        let geom = self.projector.to_storage(coordinates)?;
        let event = DeploymentEvent::remove(
            session.id,
            deployment.id,
            geom,
            location,
            scope.clone(),
        );
        self.deployment_events.create(&event).await?;

        deployment.retire(event.id);
        if let Err(err) = self.deployments.update(&deployment).await {
            warn!(%scope, deployment = %deployment.id, "remove pointer update failed, unwinding event");
            let source = Box::new(LedgerError::from(err));
            return match self.deployment_events.soft_delete(event.id).await {
                Ok(()) => Err(*source),
                Err(cleanup) => Err(LedgerError::RollbackFailed { source, cleanup }),
            };
        }

        info!(%scope, session = %session.id, deployment = %deployment.id, "gear retrieved");
        Ok(deployment)
    }

    /// Weigh the catch of one deployment.
    ///
    /// Delegates the superseding weighing write to the catch ledger, then
    /// appends the immutable WEIGH event carrying the same payload. Legal in
    /// either order around `remove`.
    pub async fn weigh(
        &self,
        scope: &OperatorScope,
        deployment_id: GearDeploymentId,
        coordinates: Coordinates,
        location: Option<LocationDescriptor>,
        counts: SpeciesCounts,
    ) -> Result<CatchWeighing, LedgerError> {
        let session = self.active_session(scope).await?;

        let weighing = self
            .catch_ledger
            .record_deployment_weighing(
                scope,
                deployment_id,
                coordinates,
                location.clone(),
                counts.clone(),
            )
            .await?;

        let event = DeploymentEvent::weigh(
            session.id,
            deployment_id,
            weighing.geom,
            location,
            counts,
            scope.clone(),
        );
        if let Err(err) = self.deployment_events.create(&event).await {
            warn!(%scope, deployment = %deployment_id, "weigh event write failed, unwinding weighing");
            let source = Box::new(LedgerError::from(err));
            return match self.weighings.delete(weighing.id).await {
                Ok(()) => Err(*source),
                Err(cleanup) => Err(LedgerError::RollbackFailed { source, cleanup }),
            };
        }

        info!(%scope, session = %session.id, deployment = %deployment_id, "catch weighed on boat");
        Ok(weighing)
    }

    /// Deployments currently in the water at a resolved location.
    pub async fn list_active_by_location(
        &self,
        scope: &OperatorScope,
        location_id: &str,
    ) -> Result<Vec<GearDeployment>, LedgerError> {
        self.active_session(scope).await?;

        let active = self.deployments.find_active(scope).await?;
        let build_ids: Vec<_> = active.iter().map(|d| d.build_event).collect();
        let build_events = self.deployment_events.find_by_ids(&build_ids).await?;

        let at_location: BTreeSet<GearDeploymentId> = build_events
            .iter()
            .filter(|e| {
                e.location
                    .as_ref()
                    .is_some_and(|l| l.id == location_id)
            })
            .filter_map(|e| e.deployment)
            .collect();

        Ok(active
            .into_iter()
            .filter(|d| at_location.contains(&d.id))
            .collect())
    }

    async fn active_session(
        &self,
        scope: &OperatorScope,
    ) -> Result<Session, LedgerError> {
        self.sessions
            .find_active(scope)
            .await?
            .ok_or(LedgerError::NotStarted)
    }
}

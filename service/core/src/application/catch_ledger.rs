// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Catch Ledger Application Service
//!
//! Records weigh-ins and answers the live "how much so far" question.
//! Shore weighings carry no deployment reference; on-boat weighings are
//! attributed to one deployment. Either way a new write supersedes the
//! prior weighing for the same (session, deployment) key inside one atomic
//! repository operation, keeping the full history while at most one row per
//! key stays current.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::catch::{CatchWeighing, PreliminaryCatch};
use crate::domain::deployment::GearDeploymentId;
use crate::domain::error::LedgerError;
use crate::domain::geo::{Coordinates, GeoProjector, LocationDescriptor};
use crate::domain::repository::{
    CatchWeighingRepository, DeploymentRepository, SessionRepository, SpeciesRepository,
};
use crate::domain::scope::OperatorScope;
use crate::domain::session::{Session, SessionId};
use crate::domain::species::SpeciesCounts;

pub struct CatchLedger {
    weighings: Arc<dyn CatchWeighingRepository>,
    species: Arc<dyn SpeciesRepository>,
    deployments: Arc<dyn DeploymentRepository>,
    sessions: Arc<dyn SessionRepository>,
    projector: Arc<dyn GeoProjector>,
}

impl CatchLedger {
    pub fn new(
        weighings: Arc<dyn CatchWeighingRepository>,
        species: Arc<dyn SpeciesRepository>,
        deployments: Arc<dyn DeploymentRepository>,
        sessions: Arc<dyn SessionRepository>,
        projector: Arc<dyn GeoProjector>,
    ) -> Self {
        Self {
            weighings,
            species,
            deployments,
            sessions,
            projector,
        }
    }

    /// Record the session-total weighing done on shore.
    pub async fn record_shore_weighing(
        &self,
        scope: &OperatorScope,
        coordinates: Coordinates,
        location: Option<LocationDescriptor>,
        counts: SpeciesCounts,
    ) -> Result<CatchWeighing, LedgerError> {
        let session = self.active_session(scope).await?;
        self.validate_species(&counts).await?;

        let geom = self.projector.to_storage(coordinates)?;
        let weighing =
            CatchWeighing::shore(session.id, counts, geom, location, scope.clone());
        self.weighings.insert_superseding(&weighing).await?;

        info!(%scope, session = %session.id, "shore weighing recorded");
        Ok(weighing)
    }

    /// Record a weighing attributed to one deployment.
    ///
    /// The deployment does not have to be active: catch may be weighed
    /// before or after the gear comes out of the water.
    pub async fn record_deployment_weighing(
        &self,
        scope: &OperatorScope,
        deployment: GearDeploymentId,
        coordinates: Coordinates,
        location: Option<LocationDescriptor>,
        counts: SpeciesCounts,
    ) -> Result<CatchWeighing, LedgerError> {
        let session = self.active_session(scope).await?;
        self.deployments
            .find_by_id(scope, deployment)
            .await?
            .ok_or(LedgerError::DeploymentNotFound(deployment))?;
        self.validate_species(&counts).await?;

        let geom = self.projector.to_storage(coordinates)?;
        let weighing = CatchWeighing::on_boat(
            session.id,
            deployment,
            counts,
            geom,
            location,
            scope.clone(),
        );
        self.weighings.insert_superseding(&weighing).await?;

        info!(%scope, session = %session.id, %deployment, "deployment weighing recorded");
        Ok(weighing)
    }

    /// Live catch aggregate for the scope's open session.
    pub async fn preliminary_total(
        &self,
        scope: &OperatorScope,
        deployment_filter: Option<GearDeploymentId>,
    ) -> Result<PreliminaryCatch, LedgerError> {
        let session = self.active_session(scope).await?;
        self.preliminary_total_for_session(session, deployment_filter)
            .await
    }

    /// Same aggregate for an explicit session (used once a session closed).
    pub async fn preliminary_total_for(
        &self,
        scope: &OperatorScope,
        session: SessionId,
        deployment_filter: Option<GearDeploymentId>,
    ) -> Result<PreliminaryCatch, LedgerError> {
        let session = self
            .sessions
            .find_by_id(scope, session)
            .await?
            .ok_or(LedgerError::SessionNotFound(session))?;
        self.preliminary_total_for_session(session, deployment_filter)
            .await
    }

    async fn preliminary_total_for_session(
        &self,
        session: Session,
        deployment_filter: Option<GearDeploymentId>,
    ) -> Result<PreliminaryCatch, LedgerError> {
        debug!(session = %session.id, "aggregating preliminary catch");
        let weighings = self
            .weighings
            .find_for_session(session.id, deployment_filter, false)
            .await?;
        Ok(PreliminaryCatch::from_weighings(weighings))
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

    /// Every species id in the payload must resolve against the catalog.
    async fn validate_species(&self, counts: &SpeciesCounts) -> Result<(), LedgerError> {
        let ids = counts.species_ids();
        let known = self.species.find_by_ids(&ids).await?;
        if known.len() != ids.len() {
            return Err(LedgerError::InvalidSpecies);
        }
        Ok(())
    }
}

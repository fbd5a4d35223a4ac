// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository contracts defined in
//! `crate::domain::repository`.
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! Production implementations backed by PostgreSQL via `sqlx`:
//! - **PostgresSessionRepository** / **PostgresSessionEventRepository**
//! - **PostgresGearRepository** / **PostgresGearTypeRepository** /
//!   **PostgresSpeciesRepository**
//! - **PostgresDeploymentRepository** / **PostgresDeploymentEventRepository**
//! - **PostgresCatchWeighingRepository**
//!
//! ## In-Memory Repositories
//!
//! Thread-safe HashMap-backed implementations for development and testing.
//! The two contracts carrying atomicity requirements hold them under a
//! single write-lock critical section here: `create_if_none_active` and
//! `insert_superseding`.

pub mod postgres_catch;
pub mod postgres_deployment;
pub mod postgres_gear;
pub mod postgres_session;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::catch::{CatchWeighing, CatchWeighingId};
use crate::domain::deployment::{
    DeploymentEvent, DeploymentEventId, DeploymentEventKind, GearDeployment,
    GearDeploymentId,
};
use crate::domain::gear::{Gear, GearId, GearType, GearTypeId};
use crate::domain::repository::{
    CatchWeighingRepository, DeploymentEventRepository, DeploymentRepository,
    GearRepository, GearTypeRepository, RepositoryError, SessionEventRepository,
    SessionRepository, SpeciesRepository,
};
use crate::domain::scope::OperatorScope;
use crate::domain::session::{Session, SessionEvent, SessionEventId, SessionId};
use crate::domain::species::{Species, SpeciesId};

#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unfiltered snapshot (test assertions).
    pub fn all(&self) -> Vec<Session> {
        self.sessions.read().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn create_if_none_active(
        &self,
        session: &Session,
    ) -> Result<bool, RepositoryError> {
        // Check and insert under one write guard; this is the in-memory
        // equivalent of the conditional INSERT the Postgres backend runs.
        let mut sessions = self.sessions.write().unwrap();
        let open_exists = sessions
            .values()
            .any(|s| session.scope.owns(&s.scope) && s.deleted_at.is_none() && s.is_open());
        if open_exists {
            return Ok(false);
        }
        sessions.insert(session.id, session.clone());
        Ok(true)
    }

    async fn update(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().unwrap();
        if !sessions.contains_key(&session.id) {
            return Err(RepositoryError::NotFound(format!(
                "Session {}",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: SessionId,
    ) -> Result<Option<Session>, RepositoryError> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .get(&id)
            .filter(|s| scope.owns(&s.scope) && s.deleted_at.is_none())
            .cloned())
    }

    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Option<Session>, RepositoryError> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .values()
            .find(|s| scope.owns(&s.scope) && s.deleted_at.is_none() && s.is_open())
            .cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemorySessionEventRepository {
    events: Arc<RwLock<HashMap<SessionEventId, SessionEvent>>>,
}

impl InMemorySessionEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unfiltered snapshot (test assertions).
    pub fn all(&self) -> Vec<SessionEvent> {
        self.events.read().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl SessionEventRepository for InMemorySessionEventRepository {
    async fn create(&self, event: &SessionEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().unwrap();
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_ids(
        &self,
        ids: &[SessionEventId],
    ) -> Result<Vec<SessionEvent>, RepositoryError> {
        let events = self.events.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| events.get(id))
            .filter(|e| e.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: SessionEventId) -> Result<(), RepositoryError> {
        let mut events = self.events.write().unwrap();
        let event = events
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Session event {}", id)))?;
        event.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGearRepository {
    gear: Arc<RwLock<HashMap<GearId, Gear>>>,
}

impl InMemoryGearRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GearRepository for InMemoryGearRepository {
    async fn create(&self, gear: &Gear) -> Result<(), RepositoryError> {
        let mut items = self.gear.write().unwrap();
        items.insert(gear.id, gear.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<Option<Gear>, RepositoryError> {
        let items = self.gear.read().unwrap();
        Ok(items
            .get(&id)
            .filter(|g| scope.owns(&g.scope) && !g.is_deleted())
            .cloned())
    }

    async fn find_by_ids(
        &self,
        scope: &OperatorScope,
        ids: &[GearId],
    ) -> Result<Vec<Gear>, RepositoryError> {
        let items = self.gear.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| items.get(id))
            .filter(|g| scope.owns(&g.scope) && !g.is_deleted())
            .cloned()
            .collect())
    }

    async fn list(&self, scope: &OperatorScope) -> Result<Vec<Gear>, RepositoryError> {
        let items = self.gear.read().unwrap();
        let mut gear: Vec<Gear> = items
            .values()
            .filter(|g| scope.owns(&g.scope) && !g.is_deleted())
            .cloned()
            .collect();
        gear.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(gear)
    }

    async fn count(&self, scope: &OperatorScope) -> Result<u64, RepositoryError> {
        let items = self.gear.read().unwrap();
        Ok(items
            .values()
            .filter(|g| scope.owns(&g.scope) && !g.is_deleted())
            .count() as u64)
    }

    async fn find_by_seal_number(
        &self,
        seal_number: &str,
    ) -> Result<Option<Gear>, RepositoryError> {
        let items = self.gear.read().unwrap();
        Ok(items
            .values()
            .find(|g| g.seal_number == seal_number && !g.is_deleted())
            .cloned())
    }

    async fn soft_delete(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<(), RepositoryError> {
        let mut items = self.gear.write().unwrap();
        let gear = items
            .get_mut(&id)
            .filter(|g| scope.owns(&g.scope))
            .ok_or_else(|| RepositoryError::NotFound(format!("Gear {}", id)))?;
        gear.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGearTypeRepository {
    types: Arc<RwLock<HashMap<GearTypeId, GearType>>>,
}

impl InMemoryGearTypeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog (development and tests).
    pub fn insert(&self, gear_type: GearType) {
        let mut types = self.types.write().unwrap();
        types.insert(gear_type.id, gear_type);
    }
}

#[async_trait]
impl GearTypeRepository for InMemoryGearTypeRepository {
    async fn find_by_id(
        &self,
        id: GearTypeId,
    ) -> Result<Option<GearType>, RepositoryError> {
        let types = self.types.read().unwrap();
        Ok(types.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<GearType>, RepositoryError> {
        let types = self.types.read().unwrap();
        let mut all: Vec<GearType> = types.values().cloned().collect();
        all.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(all)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySpeciesRepository {
    species: Arc<RwLock<HashMap<SpeciesId, Species>>>,
}

impl InMemorySpeciesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog (development and tests).
    pub fn insert(&self, species: Species) {
        let mut all = self.species.write().unwrap();
        all.insert(species.id, species);
    }
}

#[async_trait]
impl SpeciesRepository for InMemorySpeciesRepository {
    async fn find_by_ids(
        &self,
        ids: &[SpeciesId],
    ) -> Result<Vec<Species>, RepositoryError> {
        let all = self.species.read().unwrap();
        Ok(ids.iter().filter_map(|id| all.get(id)).cloned().collect())
    }

    async fn list(&self) -> Result<Vec<Species>, RepositoryError> {
        let all = self.species.read().unwrap();
        Ok(all.values().cloned().collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeploymentRepository {
    deployments: Arc<RwLock<HashMap<GearDeploymentId, GearDeployment>>>,
}

impl InMemoryDeploymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unfiltered snapshot (test assertions).
    pub fn all(&self) -> Vec<GearDeployment> {
        self.deployments.read().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl DeploymentRepository for InMemoryDeploymentRepository {
    async fn create(&self, deployment: &GearDeployment) -> Result<(), RepositoryError> {
        let mut deployments = self.deployments.write().unwrap();
        deployments.insert(deployment.id, deployment.clone());
        Ok(())
    }

    async fn update(&self, deployment: &GearDeployment) -> Result<(), RepositoryError> {
        let mut deployments = self.deployments.write().unwrap();
        if !deployments.contains_key(&deployment.id) {
            return Err(RepositoryError::NotFound(format!(
                "Deployment {}",
                deployment.id
            )));
        }
        deployments.insert(deployment.id, deployment.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<Option<GearDeployment>, RepositoryError> {
        let deployments = self.deployments.read().unwrap();
        Ok(deployments
            .get(&id)
            .filter(|d| scope.owns(&d.scope) && d.deleted_at.is_none())
            .cloned())
    }

    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Vec<GearDeployment>, RepositoryError> {
        let deployments = self.deployments.read().unwrap();
        Ok(deployments
            .values()
            .filter(|d| scope.owns(&d.scope) && d.is_active())
            .cloned()
            .collect())
    }

    async fn find_active_containing_gear(
        &self,
        scope: &OperatorScope,
        gear: &[GearId],
    ) -> Result<Vec<GearDeployment>, RepositoryError> {
        let deployments = self.deployments.read().unwrap();
        Ok(deployments
            .values()
            .filter(|d| {
                scope.owns(&d.scope)
                    && d.is_active()
                    && gear.iter().any(|g| d.contains_gear(*g))
            })
            .cloned()
            .collect())
    }

    async fn delete(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<(), RepositoryError> {
        let mut deployments = self.deployments.write().unwrap();
        if let Some(deployment) = deployments.get(&id) {
            if scope.owns(&deployment.scope) {
                deployments.remove(&id);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeploymentEventRepository {
    events: Arc<RwLock<HashMap<DeploymentEventId, DeploymentEvent>>>,
}

impl InMemoryDeploymentEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeploymentEventRepository for InMemoryDeploymentEventRepository {
    async fn create(&self, event: &DeploymentEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().unwrap();
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_ids(
        &self,
        ids: &[DeploymentEventId],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError> {
        let events = self.events.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| events.get(id))
            .filter(|e| e.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_for_session(
        &self,
        session: SessionId,
        kinds: &[DeploymentEventKind],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError> {
        let events = self.events.read().unwrap();
        let mut matching: Vec<DeploymentEvent> = events
            .values()
            .filter(|e| {
                e.session == session && e.deleted_at.is_none() && kinds.contains(&e.kind)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }

    async fn soft_delete(&self, id: DeploymentEventId) -> Result<(), RepositoryError> {
        let mut events = self.events.write().unwrap();
        let event = events
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Deployment event {}", id)))?;
        event.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCatchWeighingRepository {
    weighings: Arc<RwLock<HashMap<CatchWeighingId, CatchWeighing>>>,
}

impl InMemoryCatchWeighingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatchWeighingRepository for InMemoryCatchWeighingRepository {
    async fn insert_superseding(
        &self,
        weighing: &CatchWeighing,
    ) -> Result<(), RepositoryError> {
        // Supersede and insert under one write guard, matching the single
        // CTE statement the Postgres backend runs.
        let mut weighings = self.weighings.write().unwrap();
        let now = Utc::now();
        for prior in weighings.values_mut() {
            if prior.session == weighing.session
                && prior.deployment == weighing.deployment
                && prior.deleted_at.is_none()
            {
                prior.deleted_at = Some(now);
            }
        }
        weighings.insert(weighing.id, weighing.clone());
        Ok(())
    }

    async fn find_for_session(
        &self,
        session: SessionId,
        deployment: Option<GearDeploymentId>,
        include_superseded: bool,
    ) -> Result<Vec<CatchWeighing>, RepositoryError> {
        let weighings = self.weighings.read().unwrap();
        let mut matching: Vec<CatchWeighing> = weighings
            .values()
            .filter(|w| w.session == session)
            .filter(|w| include_superseded || !w.is_superseded())
            .filter(|w| deployment.is_none() || w.deployment == deployment)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn any_deployment_weighing(
        &self,
        session: SessionId,
    ) -> Result<bool, RepositoryError> {
        let weighings = self.weighings.read().unwrap();
        Ok(weighings.values().any(|w| {
            w.session == session && w.deployment.is_some() && !w.is_superseded()
        }))
    }

    async fn any_shore_weighing(
        &self,
        session: SessionId,
    ) -> Result<bool, RepositoryError> {
        let weighings = self.weighings.read().unwrap();
        Ok(weighings.values().any(|w| {
            w.session == session && w.deployment.is_none() && !w.is_superseded()
        }))
    }

    async fn delete(&self, id: CatchWeighingId) -> Result<(), RepositoryError> {
        let mut weighings = self.weighings.write().unwrap();
        weighings.remove(&id);
        Ok(())
    }
}

// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! Persistence contracts of the ledger core.
//!
//! One repository trait per aggregate, defined here in the domain layer and
//! implemented in `crate::infrastructure::repositories`: in-memory for
//! development and testing, PostgreSQL for production, selected at startup
//! from configuration.
//!
//! Two contracts carry invariants the application layer cannot enforce
//! without a transaction:
//! - [`SessionRepository::create_if_none_active`]: conditional insert
//!   backing the single-active-session rule, atomic per backend.
//! - [`CatchWeighingRepository::insert_superseding`]: supersede-on-insert
//!   for the (session, deployment) weighing key, one atomic operation, never
//!   two round trips.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catch::{CatchWeighing, CatchWeighingId};
use crate::domain::deployment::{
    DeploymentEvent, DeploymentEventId, DeploymentEventKind, GearDeployment,
    GearDeploymentId,
};
use crate::domain::gear::{Gear, GearId, GearType, GearTypeId};
use crate::domain::scope::OperatorScope;
use crate::domain::session::{Session, SessionEvent, SessionEventId, SessionId};
use crate::domain::species::{Species, SpeciesId};

/// Storage backend selection for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    Postgres(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert unconditionally (used for skipped sessions, which carry no
    /// exclusivity rule).
    async fn create(&self, session: &Session) -> Result<(), RepositoryError>;

    /// Insert `session` only if the scope has no open session (start set,
    /// end unset, not deleted). Returns `false`, writing nothing, when an
    /// open session exists. Atomic with respect to concurrent callers.
    async fn create_if_none_active(
        &self,
        session: &Session,
    ) -> Result<bool, RepositoryError>;

    /// Persist a changed session (the only legal change attaches the end
    /// event).
    async fn update(&self, session: &Session) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: SessionId,
    ) -> Result<Option<Session>, RepositoryError>;

    /// The scope's open session, if any.
    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Option<Session>, RepositoryError>;
}

#[async_trait]
pub trait SessionEventRepository: Send + Sync {
    async fn create(&self, event: &SessionEvent) -> Result<(), RepositoryError>;

    async fn find_by_ids(
        &self,
        ids: &[SessionEventId],
    ) -> Result<Vec<SessionEvent>, RepositoryError>;

    /// Compensation path: unwind an event whose owning session write failed.
    async fn soft_delete(&self, id: SessionEventId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait GearRepository: Send + Sync {
    async fn create(&self, gear: &Gear) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<Option<Gear>, RepositoryError>;

    /// Resolve ids to non-deleted gear within scope; missing ids are simply
    /// absent from the result.
    async fn find_by_ids(
        &self,
        scope: &OperatorScope,
        ids: &[GearId],
    ) -> Result<Vec<Gear>, RepositoryError>;

    async fn list(&self, scope: &OperatorScope) -> Result<Vec<Gear>, RepositoryError>;

    async fn count(&self, scope: &OperatorScope) -> Result<u64, RepositoryError>;

    /// Seal-number lookup across all scopes, non-deleted gear only.
    async fn find_by_seal_number(
        &self,
        seal_number: &str,
    ) -> Result<Option<Gear>, RepositoryError>;

    async fn soft_delete(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait GearTypeRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: GearTypeId,
    ) -> Result<Option<GearType>, RepositoryError>;

    async fn list(&self) -> Result<Vec<GearType>, RepositoryError>;
}

#[async_trait]
pub trait SpeciesRepository: Send + Sync {
    async fn find_by_ids(
        &self,
        ids: &[SpeciesId],
    ) -> Result<Vec<Species>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Species>, RepositoryError>;
}

#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn create(&self, deployment: &GearDeployment) -> Result<(), RepositoryError>;

    async fn update(&self, deployment: &GearDeployment) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<Option<GearDeployment>, RepositoryError>;

    /// Active deployments (remove event unset) for the scope.
    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Vec<GearDeployment>, RepositoryError>;

    /// Active deployments referencing any of the given gear ids.
    async fn find_active_containing_gear(
        &self,
        scope: &OperatorScope,
        gear: &[GearId],
    ) -> Result<Vec<GearDeployment>, RepositoryError>;

    /// Compensation path: remove a deployment row whose BUILD event write
    /// failed. A hard delete; the row never became observable.
    async fn delete(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait DeploymentEventRepository: Send + Sync {
    async fn create(&self, event: &DeploymentEvent) -> Result<(), RepositoryError>;

    async fn find_by_ids(
        &self,
        ids: &[DeploymentEventId],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError>;

    async fn find_for_session(
        &self,
        session: SessionId,
        kinds: &[DeploymentEventKind],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError>;

    /// Compensation path: unwind an event whose companion pointer update
    /// failed.
    async fn soft_delete(&self, id: DeploymentEventId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CatchWeighingRepository: Send + Sync {
    /// Insert `weighing` and mark every prior non-superseded row for the
    /// same (session, deployment) pair superseded, as one atomic operation.
    async fn insert_superseding(
        &self,
        weighing: &CatchWeighing,
    ) -> Result<(), RepositoryError>;

    /// Weighings for a session, newest first. Superseded rows are excluded
    /// unless `include_superseded` (audit reads) is set.
    async fn find_for_session(
        &self,
        session: SessionId,
        deployment: Option<GearDeploymentId>,
        include_superseded: bool,
    ) -> Result<Vec<CatchWeighing>, RepositoryError>;

    /// Any non-superseded weighing attributed to a deployment of this
    /// session?
    async fn any_deployment_weighing(
        &self,
        session: SessionId,
    ) -> Result<bool, RepositoryError>;

    /// Any non-superseded shore weighing for this session?
    async fn any_shore_weighing(
        &self,
        session: SessionId,
    ) -> Result<bool, RepositoryError>;

    /// Compensation path: remove a weighing whose WEIGH event write failed.
    async fn delete(&self, id: CatchWeighingId) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::gear::GearId;
use crate::domain::geo::{GeoPoint, LocationDescriptor};
use crate::domain::scope::OperatorScope;
use crate::domain::session::SessionId;
use crate::domain::species::SpeciesCounts;

/// Unique identifier for a gear deployment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GearDeploymentId(pub Uuid);

impl GearDeploymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for GearDeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GearDeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a deployment event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentEventId(pub Uuid);

impl DeploymentEventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for DeploymentEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentEventKind {
    Build,
    Remove,
    Weigh,
}

/// Immutable deployment fact: gear went in, gear came out, catch was weighed.
///
/// Carries the location descriptor snapshot captured at event time. The
/// catch payload is present only for WEIGH events. Soft-deletion exists only
/// to unwind an event whose companion row write failed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentEvent {
    pub id: DeploymentEventId,
    pub kind: DeploymentEventKind,
    pub geom: GeoPoint,
    pub location: Option<LocationDescriptor>,
    pub session: SessionId,
    pub deployment: Option<GearDeploymentId>,
    pub catch: Option<SpeciesCounts>,
    pub scope: OperatorScope,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DeploymentEvent {
    /// BUILD event with a caller-assigned id, so the deployment row can
    /// reference the event before either row has been persisted.
    pub fn build(
        id: DeploymentEventId,
        session: SessionId,
        deployment: GearDeploymentId,
        geom: GeoPoint,
        location: Option<LocationDescriptor>,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id,
            kind: DeploymentEventKind::Build,
            geom,
            location,
            session,
            deployment: Some(deployment),
            catch: None,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn remove(
        session: SessionId,
        deployment: GearDeploymentId,
        geom: GeoPoint,
        location: Option<LocationDescriptor>,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: DeploymentEventId::new(),
            kind: DeploymentEventKind::Remove,
            geom,
            location,
            session,
            deployment: Some(deployment),
            catch: None,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn weigh(
        session: SessionId,
        deployment: GearDeploymentId,
        geom: GeoPoint,
        location: Option<LocationDescriptor>,
        catch: SpeciesCounts,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: DeploymentEventId::new(),
            kind: DeploymentEventKind::Weigh,
            geom,
            location,
            session,
            deployment: Some(deployment),
            catch: Some(catch),
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

/// A placement of one or more gear items in the water during one session.
///
/// Mutable current-state row pointing at immutable [`DeploymentEvent`]
/// records: created referencing its BUILD event, mutated exactly once to
/// attach the REMOVE event. `remove_event` unset means the gear is still in
/// the water, and while it is, every referenced gear item is locked to this
/// deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearDeployment {
    pub id: GearDeploymentId,
    pub gear: Vec<GearId>,
    pub build_event: DeploymentEventId,
    pub remove_event: Option<DeploymentEventId>,
    pub scope: OperatorScope,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl GearDeployment {
    pub fn new(
        gear: Vec<GearId>,
        build_event: DeploymentEventId,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: GearDeploymentId::new(),
            gear,
            build_event,
            remove_event: None,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remove_event.is_none() && self.deleted_at.is_none()
    }

    pub fn contains_gear(&self, gear: GearId) -> bool {
        self.gear.contains(&gear)
    }

    /// Attach the REMOVE event, retrieving the gear from the water.
    pub fn retire(&mut self, remove_event: DeploymentEventId) {
        self.remove_event = Some(remove_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scope::OperatorId;

    #[test]
    fn test_deployment_active_until_retired() {
        let scope = OperatorScope::personal(OperatorId::new());
        let gear = GearId::new();
        let mut deployment =
            GearDeployment::new(vec![gear], DeploymentEventId::new(), scope);
        assert!(deployment.is_active());
        assert!(deployment.contains_gear(gear));
        assert!(!deployment.contains_gear(GearId::new()));

        deployment.retire(DeploymentEventId::new());
        assert!(!deployment.is_active());
    }
}

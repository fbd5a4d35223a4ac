// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::deployment::GearDeploymentId;
use crate::domain::geo::{GeoPoint, LocationDescriptor};
use crate::domain::scope::OperatorScope;
use crate::domain::session::SessionId;
use crate::domain::species::SpeciesCounts;

/// Unique identifier for a catch weighing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatchWeighingId(pub Uuid);

impl CatchWeighingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CatchWeighingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded weigh-in, either attributed to one deployment ("on boat") or
/// session-wide with no deployment reference ("on shore").
///
/// Weighings are never updated in place. Re-weighing the same (session,
/// deployment) pair inserts a new row and marks the prior ones superseded
/// (`deleted_at` set) in the same atomic repository operation, so the full
/// history stays readable while at most one row per pair is current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchWeighing {
    pub id: CatchWeighingId,
    pub session: SessionId,
    pub deployment: Option<GearDeploymentId>,
    pub counts: SpeciesCounts,
    pub geom: GeoPoint,
    pub location: Option<LocationDescriptor>,
    pub scope: OperatorScope,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CatchWeighing {
    /// Session-wide shore weighing, no deployment attribution.
    pub fn shore(
        session: SessionId,
        counts: SpeciesCounts,
        geom: GeoPoint,
        location: Option<LocationDescriptor>,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: CatchWeighingId::new(),
            session,
            deployment: None,
            counts,
            geom,
            location,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Weighing attributed to one deployment.
    pub fn on_boat(
        session: SessionId,
        deployment: GearDeploymentId,
        counts: SpeciesCounts,
        geom: GeoPoint,
        location: Option<LocationDescriptor>,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: CatchWeighingId::new(),
            session,
            deployment: Some(deployment),
            counts,
            geom,
            location,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Live aggregate of a session's catch while it is still open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreliminaryCatch {
    /// The current shore (session-total) weighing, if one was recorded.
    pub shore: Option<SpeciesCounts>,
    /// Newest weighing per deployment, summed across deployments.
    pub on_boat: SpeciesCounts,
}

impl PreliminaryCatch {
    /// Aggregate non-superseded weighings, newest first.
    ///
    /// Per-deployment rows are deduplicated by deployment id keeping only
    /// the newest per id before summing. Supersession already guarantees at
    /// most one current row per pair; the dedup is a second, independent
    /// guard so that a duplicate slipping past it (two writers racing the
    /// supersession statement) still cannot double-count.
    pub fn from_weighings(mut weighings: Vec<CatchWeighing>) -> Self {
        weighings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut shore: Option<SpeciesCounts> = None;
        let mut seen: BTreeSet<GearDeploymentId> = BTreeSet::new();
        let mut on_boat = SpeciesCounts::new();

        for weighing in weighings {
            match weighing.deployment {
                None => {
                    if shore.is_none() {
                        shore = Some(weighing.counts);
                    }
                }
                Some(deployment) => {
                    if seen.insert(deployment) {
                        on_boat.merge(&weighing.counts);
                    }
                }
            }
        }

        Self { shore, on_boat }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scope::{OperatorId, OperatorScope};
    use crate::domain::species::SpeciesId;
    use chrono::Duration;

    fn scope() -> OperatorScope {
        OperatorScope::personal(OperatorId::new())
    }

    fn point() -> GeoPoint {
        GeoPoint { x: 0.0, y: 0.0 }
    }

    fn weighing(
        session: SessionId,
        deployment: Option<GearDeploymentId>,
        counts: SpeciesCounts,
        age: Duration,
    ) -> CatchWeighing {
        let mut w = match deployment {
            Some(d) => CatchWeighing::on_boat(session, d, counts, point(), None, scope()),
            None => CatchWeighing::shore(session, counts, point(), None, scope()),
        };
        w.created_at = Utc::now() - age;
        w
    }

    #[test]
    fn test_newest_shore_record_wins() {
        let session = SessionId::new();
        let pike = SpeciesId::new();
        let old = weighing(
            session,
            None,
            [(pike, 2)].into_iter().collect(),
            Duration::minutes(10),
        );
        let new = weighing(
            session,
            None,
            [(pike, 7)].into_iter().collect(),
            Duration::minutes(1),
        );

        let total = PreliminaryCatch::from_weighings(vec![old, new]);
        assert_eq!(total.shore.unwrap().get(pike), 7);
    }

    #[test]
    fn test_dedup_keeps_newest_per_deployment_without_supersession() {
        // Two current rows for the same deployment, as left behind by
        // writers racing past the supersession statement. The aggregate must
        // equal the newest row's counts, not the sum of both.
        let session = SessionId::new();
        let deployment = GearDeploymentId::new();
        let pike = SpeciesId::new();
        let stale = weighing(
            session,
            Some(deployment),
            [(pike, 4)].into_iter().collect(),
            Duration::minutes(10),
        );
        let current = weighing(
            session,
            Some(deployment),
            [(pike, 6)].into_iter().collect(),
            Duration::minutes(1),
        );

        let total = PreliminaryCatch::from_weighings(vec![stale, current]);
        assert_eq!(total.on_boat.get(pike), 6);
    }

    #[test]
    fn test_sums_across_distinct_deployments() {
        let session = SessionId::new();
        let pike = SpeciesId::new();
        let perch = SpeciesId::new();
        let first = weighing(
            session,
            Some(GearDeploymentId::new()),
            [(pike, 3), (perch, 1)].into_iter().collect(),
            Duration::minutes(5),
        );
        let second = weighing(
            session,
            Some(GearDeploymentId::new()),
            [(pike, 2)].into_iter().collect(),
            Duration::minutes(2),
        );

        let total = PreliminaryCatch::from_weighings(vec![first, second]);
        assert_eq!(total.on_boat.get(pike), 5);
        assert_eq!(total.on_boat.get(perch), 1);
        assert!(total.shore.is_none());
    }
}

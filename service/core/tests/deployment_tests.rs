// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Deployment ledger integration tests: build/remove lifecycle, gear
//! exclusivity, the net-only grouping rule and the compensating rollback
//! when the event write of a two-row action fails.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::Harness;
use fishtrail_core::application::DeploymentLedger;
use fishtrail_core::domain::deployment::{
    DeploymentEvent, DeploymentEventId, DeploymentEventKind, GearDeploymentId,
};
use fishtrail_core::domain::error::LedgerError;
use fishtrail_core::domain::gear::GearId;
use fishtrail_core::domain::geo::{LocationDescriptor, Municipality};
use fishtrail_core::domain::repository::{
    CatchWeighingRepository, DeploymentEventRepository, DeploymentRepository,
    RepositoryError,
};
use fishtrail_core::domain::scope::{OperatorId, OperatorScope};
use fishtrail_core::domain::session::{SessionId, SessionType};
use fishtrail_core::domain::species::SpeciesCounts;
use fishtrail_core::infrastructure::geo::PassthroughProjector;
use fishtrail_core::infrastructure::repositories::InMemoryDeploymentRepository;

fn location(id: &str) -> LocationDescriptor {
    LocationDescriptor {
        id: id.to_string(),
        name: "Nemunas".to_string(),
        municipality: Some(Municipality {
            id: 21,
            name: "Šilutė".to_string(),
        }),
    }
}

async fn started(h: &Harness) {
    h.session_ledger
        .start(&h.scope, SessionType::InlandWaters, h.coords(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_build_requires_active_session() {
    let h = Harness::new();
    let net = h.net("A-100").await;

    let err = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotStarted));
}

#[tokio::test]
async fn test_build_with_no_gear_is_refused() {
    let h = Harness::new();
    h.net("A-100").await;
    started(&h).await;

    let err = h
        .deployment_ledger
        .build(&h.scope, vec![], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NoGearSelected));
}

#[tokio::test]
async fn test_build_with_unknown_gear_is_refused() {
    let h = Harness::new();
    h.net("A-100").await;
    started(&h).await;

    let err = h
        .deployment_ledger
        .build(&h.scope, vec![GearId::new()], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GearNotFound));
}

#[tokio::test]
async fn test_foreign_gear_is_invisible() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    // A second operator with their own gear and session tries to deploy the
    // first operator's net: out of scope means not found.
    let other = OperatorScope::personal(OperatorId::new());
    h.registry
        .register(
            &other,
            "Z-900".to_string(),
            h.net_type.id,
            30,
            fishtrail_core::domain::gear::GearCalibration::Net { net_length_m: 45 },
        )
        .await
        .unwrap();
    h.session_ledger
        .start(&other, SessionType::InlandWaters, h.coords(), None)
        .await
        .unwrap();

    let err = h
        .deployment_ledger
        .build(&other, vec![net.id], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GearNotFound));
}

#[tokio::test]
async fn test_deployed_gear_is_exclusive() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    h.deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    let deployments_before = h.deployments.all().len();

    let err = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GearInUse));
    assert_eq!(h.deployments.all().len(), deployments_before);

    // The registry reflects the in-water state.
    let listed = h.registry.list(&h.scope).await.unwrap();
    assert!(listed.iter().any(|g| g.gear.id == net.id && g.in_water));
}

#[tokio::test]
async fn test_grouping_mixed_types_is_refused() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;
    let other_net = h
        .registry
        .register(
            &h.scope,
            "B-200".to_string(),
            h.second_net_type.id,
            30,
            fishtrail_core::domain::gear::GearCalibration::Net { net_length_m: 120 },
        )
        .await
        .unwrap();

    let err = h
        .deployment_ledger
        .build(&h.scope, vec![net.id, other_net.id], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::TooManyGearTypes));
}

#[tokio::test]
async fn test_grouping_catchers_is_refused_even_with_one_type() {
    let h = Harness::new();
    let first = h.catcher("C-300").await;
    let second = h.catcher("C-301").await;
    started(&h).await;

    let err = h
        .deployment_ledger
        .build(&h.scope, vec![first.id, second.id], h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidGearCategory));
}

#[tokio::test]
async fn test_grouping_nets_of_one_type_succeeds() {
    let h = Harness::new();
    let first = h.net("A-100").await;
    let second = h.net("A-101").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![first.id, second.id], h.coords(), None)
        .await
        .unwrap();
    assert_eq!(deployment.gear.len(), 2);
    assert!(deployment.is_active());
}

#[tokio::test]
async fn test_remove_frees_gear_for_redeployment() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    let removed = h
        .deployment_ledger
        .remove(&h.scope, deployment.id, h.coords(), None)
        .await
        .unwrap();
    assert!(removed.remove_event.is_some());

    // Gear freed: a new deployment with the same net passes.
    h.deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    let first = h
        .deployment_ledger
        .remove(&h.scope, deployment.id, h.coords(), None)
        .await
        .unwrap();
    let second = h
        .deployment_ledger
        .remove(&h.scope, deployment.id, h.coords(), None)
        .await
        .unwrap();

    assert_eq!(first.remove_event, second.remove_event);
    let remove_events = h
        .deployment_events
        .find_for_session(
            h.sessions.all()[0].id,
            &[DeploymentEventKind::Remove],
        )
        .await
        .unwrap();
    assert_eq!(remove_events.len(), 1);
}

#[tokio::test]
async fn test_remove_unknown_deployment_is_refused() {
    let h = Harness::new();
    h.net("A-100").await;
    started(&h).await;

    let missing = GearDeploymentId::new();
    let err = h
        .deployment_ledger
        .remove(&h.scope, missing, h.coords(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DeploymentNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_weigh_records_weighing_and_event() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    let counts: SpeciesCounts = [(h.pike, 4)].into_iter().collect();
    let weighing = h
        .deployment_ledger
        .weigh(&h.scope, deployment.id, h.coords(), None, counts.clone())
        .await
        .unwrap();
    assert_eq!(weighing.deployment, Some(deployment.id));
    assert_eq!(weighing.counts, counts);

    let weigh_events = h
        .deployment_events
        .find_for_session(weighing.session, &[DeploymentEventKind::Weigh])
        .await
        .unwrap();
    assert_eq!(weigh_events.len(), 1);
    assert_eq!(weigh_events[0].catch.as_ref(), Some(&counts));
}

#[tokio::test]
async fn test_weigh_after_remove_is_allowed() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    h.deployment_ledger
        .remove(&h.scope, deployment.id, h.coords(), None)
        .await
        .unwrap();

    let counts: SpeciesCounts = [(h.perch, 2)].into_iter().collect();
    let weighing = h
        .deployment_ledger
        .weigh(&h.scope, deployment.id, h.coords(), None, counts)
        .await
        .unwrap();
    assert_eq!(weighing.deployment, Some(deployment.id));
}

#[tokio::test]
async fn test_list_active_by_location_matches_build_snapshot() {
    let h = Harness::new();
    let first = h.net("A-100").await;
    let second = h.net("A-101").await;
    started(&h).await;

    let here = h
        .deployment_ledger
        .build(&h.scope, vec![first.id], h.coords(), Some(location("10010001")))
        .await
        .unwrap();
    h.deployment_ledger
        .build(&h.scope, vec![second.id], h.coords(), Some(location("99999999")))
        .await
        .unwrap();

    let at_spot = h
        .deployment_ledger
        .list_active_by_location(&h.scope, "10010001")
        .await
        .unwrap();
    assert_eq!(at_spot.len(), 1);
    assert_eq!(at_spot[0].id, here.id);

    // Removed deployments drop out.
    h.deployment_ledger
        .remove(&h.scope, here.id, h.coords(), None)
        .await
        .unwrap();
    let at_spot = h
        .deployment_ledger
        .list_active_by_location(&h.scope, "10010001")
        .await
        .unwrap();
    assert!(at_spot.is_empty());
}

// ---------------------------------------------------------------------------
// Compensating rollback
// ---------------------------------------------------------------------------

/// Event repository whose `create` always fails, simulating the second write
/// of the build action dying after the deployment row committed.
struct FailingEventRepository;

#[async_trait]
impl DeploymentEventRepository for FailingEventRepository {
    async fn create(&self, _event: &DeploymentEvent) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database("connection reset".to_string()))
    }

    async fn find_by_ids(
        &self,
        _ids: &[DeploymentEventId],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError> {
        Ok(vec![])
    }

    async fn find_for_session(
        &self,
        _session: SessionId,
        _kinds: &[DeploymentEventKind],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError> {
        Ok(vec![])
    }

    async fn soft_delete(&self, _id: DeploymentEventId) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Deployment repository whose compensating `delete` also fails.
struct StuckDeploymentRepository {
    inner: InMemoryDeploymentRepository,
}

#[async_trait]
impl DeploymentRepository for StuckDeploymentRepository {
    async fn create(
        &self,
        deployment: &fishtrail_core::domain::deployment::GearDeployment,
    ) -> Result<(), RepositoryError> {
        self.inner.create(deployment).await
    }

    async fn update(
        &self,
        deployment: &fishtrail_core::domain::deployment::GearDeployment,
    ) -> Result<(), RepositoryError> {
        self.inner.update(deployment).await
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<Option<fishtrail_core::domain::deployment::GearDeployment>, RepositoryError>
    {
        self.inner.find_by_id(scope, id).await
    }

    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Vec<fishtrail_core::domain::deployment::GearDeployment>, RepositoryError>
    {
        self.inner.find_active(scope).await
    }

    async fn find_active_containing_gear(
        &self,
        scope: &OperatorScope,
        gear: &[GearId],
    ) -> Result<Vec<fishtrail_core::domain::deployment::GearDeployment>, RepositoryError>
    {
        self.inner.find_active_containing_gear(scope, gear).await
    }

    async fn delete(
        &self,
        _scope: &OperatorScope,
        _id: GearDeploymentId,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database("delete timed out".to_string()))
    }
}

fn ledger_with_event_repo(
    h: &Harness,
    deployments: Arc<dyn DeploymentRepository>,
    events: Arc<dyn DeploymentEventRepository>,
) -> DeploymentLedger {
    DeploymentLedger::new(
        deployments,
        events,
        h.gear.clone(),
        h.gear_types.clone(),
        h.sessions.clone(),
        h.weighings.clone(),
        h.catch_ledger.clone(),
        Arc::new(PassthroughProjector),
    )
}

#[tokio::test]
async fn test_build_unwinds_deployment_when_event_write_fails() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployments = Arc::new(InMemoryDeploymentRepository::new());
    let ledger = ledger_with_event_repo(
        &h,
        deployments.clone(),
        Arc::new(FailingEventRepository),
    );

    let err = ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap_err();

    // The caller sees the original failure, and the deployment row is gone.
    assert!(matches!(err, LedgerError::Repository(_)));
    assert!(deployments.all().is_empty());
}

#[tokio::test]
async fn test_failed_compensation_is_surfaced_distinctly() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let stuck = Arc::new(StuckDeploymentRepository {
        inner: InMemoryDeploymentRepository::new(),
    });
    let ledger = ledger_with_event_repo(&h, stuck, Arc::new(FailingEventRepository));

    let err = ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap_err();

    match err {
        LedgerError::RollbackFailed { source, cleanup } => {
            assert!(matches!(*source, LedgerError::Repository(_)));
            assert!(cleanup.to_string().contains("delete timed out"));
        }
        other => panic!("Expected RollbackFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_weigh_unwinds_weighing_when_event_write_fails() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();

    let ledger = ledger_with_event_repo(
        &h,
        h.deployments.clone(),
        Arc::new(FailingEventRepository),
    );
    let counts: SpeciesCounts = [(h.pike, 4)].into_iter().collect();
    let err = ledger
        .weigh(&h.scope, deployment.id, h.coords(), None, counts)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Repository(_)));

    // The weighing row was compensated away.
    let session = h.sessions.all()[0].id;
    let weighings = h
        .weighings
        .find_for_session(session, None, true)
        .await
        .unwrap();
    assert!(weighings.is_empty());
}

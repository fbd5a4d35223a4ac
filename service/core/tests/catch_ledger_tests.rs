// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Catch ledger integration tests: supersession on re-weighing, species
//! validation and the preliminary aggregate, including the full happy-path
//! scenario of one netting trip.

mod common;

use common::Harness;
use fishtrail_core::domain::error::LedgerError;
use fishtrail_core::domain::repository::CatchWeighingRepository;
use fishtrail_core::domain::session::{SessionState, SessionType};
use fishtrail_core::domain::species::{SpeciesCounts, SpeciesId};

async fn started(h: &Harness) {
    h.session_ledger
        .start(&h.scope, SessionType::InlandWaters, h.coords(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_weighing_requires_active_session() {
    let h = Harness::new();
    let counts: SpeciesCounts = [(h.pike, 1)].into_iter().collect();
    let err = h
        .catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, counts)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotStarted));
}

#[tokio::test]
async fn test_unknown_species_is_refused() {
    let h = Harness::new();
    h.net("A-100").await;
    started(&h).await;

    let counts: SpeciesCounts = [(SpeciesId::new(), 3)].into_iter().collect();
    let err = h
        .catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, counts)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSpecies));
}

#[tokio::test]
async fn test_second_shore_weighing_supersedes_first() {
    let h = Harness::new();
    h.net("A-100").await;
    started(&h).await;

    let first: SpeciesCounts = [(h.pike, 2)].into_iter().collect();
    let second: SpeciesCounts = [(h.pike, 7), (h.perch, 1)].into_iter().collect();
    let first_row = h
        .catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, first)
        .await
        .unwrap();
    h.catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, second.clone())
        .await
        .unwrap();

    // Only the latest shore figures count.
    let total = h.catch_ledger.preliminary_total(&h.scope, None).await.unwrap();
    assert_eq!(total.shore.unwrap(), second);

    // The superseded row is out of current reads but kept for audit.
    let session = h.sessions.all()[0].id;
    let current = h.weighings.find_for_session(session, None, false).await.unwrap();
    assert_eq!(current.len(), 1);
    let with_audit = h.weighings.find_for_session(session, None, true).await.unwrap();
    assert_eq!(with_audit.len(), 2);
    assert!(with_audit
        .iter()
        .any(|w| w.id == first_row.id && w.is_superseded()));
}

#[tokio::test]
async fn test_reweighing_a_deployment_never_double_counts() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();

    let stale: SpeciesCounts = [(h.pike, 4)].into_iter().collect();
    let corrected: SpeciesCounts = [(h.pike, 6)].into_iter().collect();
    h.catch_ledger
        .record_deployment_weighing(&h.scope, deployment.id, h.coords(), None, stale)
        .await
        .unwrap();
    h.catch_ledger
        .record_deployment_weighing(&h.scope, deployment.id, h.coords(), None, corrected)
        .await
        .unwrap();

    let total = h.catch_ledger.preliminary_total(&h.scope, None).await.unwrap();
    assert_eq!(total.on_boat.get(h.pike), 6);
}

#[tokio::test]
async fn test_shore_and_deployment_weighings_supersede_independently() {
    let h = Harness::new();
    let net = h.net("A-100").await;
    started(&h).await;

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();

    let on_boat: SpeciesCounts = [(h.pike, 4)].into_iter().collect();
    let on_shore: SpeciesCounts = [(h.pike, 4), (h.perch, 1)].into_iter().collect();
    h.catch_ledger
        .record_deployment_weighing(
            &h.scope,
            deployment.id,
            h.coords(),
            None,
            on_boat.clone(),
        )
        .await
        .unwrap();
    h.catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, on_shore.clone())
        .await
        .unwrap();

    // The shore write must not supersede the per-deployment record.
    let total = h.catch_ledger.preliminary_total(&h.scope, None).await.unwrap();
    assert_eq!(total.shore.unwrap(), on_shore);
    assert_eq!(total.on_boat, on_boat);
}

#[tokio::test]
async fn test_preliminary_total_with_deployment_filter() {
    let h = Harness::new();
    let first = h.net("A-100").await;
    let second = h.net("A-101").await;
    started(&h).await;

    let one = h
        .deployment_ledger
        .build(&h.scope, vec![first.id], h.coords(), None)
        .await
        .unwrap();
    let two = h
        .deployment_ledger
        .build(&h.scope, vec![second.id], h.coords(), None)
        .await
        .unwrap();

    h.catch_ledger
        .record_deployment_weighing(
            &h.scope,
            one.id,
            h.coords(),
            None,
            [(h.pike, 3)].into_iter().collect(),
        )
        .await
        .unwrap();
    h.catch_ledger
        .record_deployment_weighing(
            &h.scope,
            two.id,
            h.coords(),
            None,
            [(h.pike, 5)].into_iter().collect(),
        )
        .await
        .unwrap();

    let all = h.catch_ledger.preliminary_total(&h.scope, None).await.unwrap();
    assert_eq!(all.on_boat.get(h.pike), 8);

    let only_one = h
        .catch_ledger
        .preliminary_total(&h.scope, Some(one.id))
        .await
        .unwrap();
    assert_eq!(only_one.on_boat.get(h.pike), 3);
}

#[tokio::test]
async fn test_full_netting_trip_scenario() {
    let h = Harness::new();
    let net = h.net("A-100").await;

    h.session_ledger
        .start(&h.scope, SessionType::InlandWaters, h.coords(), None)
        .await
        .unwrap();

    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    assert!(h
        .registry
        .list(&h.scope)
        .await
        .unwrap()
        .iter()
        .any(|g| g.gear.id == net.id && g.in_water));

    let counts: SpeciesCounts = [(h.pike, 4)].into_iter().collect();
    h.deployment_ledger
        .weigh(&h.scope, deployment.id, h.coords(), None, counts.clone())
        .await
        .unwrap();
    let total = h
        .catch_ledger
        .preliminary_total(&h.scope, Some(deployment.id))
        .await
        .unwrap();
    assert_eq!(total.on_boat, counts);

    let removed = h
        .deployment_ledger
        .remove(&h.scope, deployment.id, h.coords(), None)
        .await
        .unwrap();
    assert!(!removed.is_active());
    assert!(h
        .registry
        .list(&h.scope)
        .await
        .unwrap()
        .iter()
        .all(|g| !g.in_water));

    h.catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, counts.clone())
        .await
        .unwrap();
    let total = h.catch_ledger.preliminary_total(&h.scope, None).await.unwrap();
    assert_eq!(total.shore.unwrap(), counts);

    let closed = h.session_ledger.end(&h.scope, h.coords()).await.unwrap();
    assert_eq!(closed.state(), SessionState::Closed);
}

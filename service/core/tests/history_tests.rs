// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! History assembler integration tests: merged ordering, per-kind payloads
//! and the exclusion of superseded weighings.

mod common;

use common::Harness;
use fishtrail_core::application::TimelineEntryKind;
use fishtrail_core::domain::error::LedgerError;
use fishtrail_core::domain::session::{SessionId, SessionType};
use fishtrail_core::domain::species::SpeciesCounts;

#[tokio::test]
async fn test_unknown_session_is_refused() {
    let h = Harness::new();
    let missing = SessionId::new();
    let err = h.history.timeline(&h.scope, missing).await.unwrap_err();
    assert!(matches!(err, LedgerError::SessionNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_timeline_merges_all_ledgers_in_order() {
    let h = Harness::new();
    let net = h.net("A-100").await;

    let session = h
        .session_ledger
        .start(&h.scope, SessionType::InlandWaters, h.coords(), None)
        .await
        .unwrap();
    let deployment = h
        .deployment_ledger
        .build(&h.scope, vec![net.id], h.coords(), None)
        .await
        .unwrap();
    let counts: SpeciesCounts = [(h.pike, 4)].into_iter().collect();
    h.deployment_ledger
        .weigh(&h.scope, deployment.id, h.coords(), None, counts.clone())
        .await
        .unwrap();
    h.deployment_ledger
        .remove(&h.scope, deployment.id, h.coords(), None)
        .await
        .unwrap();
    h.catch_ledger
        .record_shore_weighing(&h.scope, h.coords(), None, counts.clone())
        .await
        .unwrap();
    h.session_ledger.end(&h.scope, h.coords()).await.unwrap();

    let timeline = h.history.timeline(&h.scope, session.id).await.unwrap();
    let kinds: Vec<TimelineEntryKind> = timeline.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TimelineEntryKind::StartFishing,
            TimelineEntryKind::BuildGear,
            TimelineEntryKind::WeighOnBoat,
            TimelineEntryKind::RemoveGear,
            TimelineEntryKind::WeighOnShore,
            TimelineEntryKind::EndFishing,
        ]
    );

    // Ascending timestamps throughout.
    assert!(timeline.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    // Kind-specific payloads.
    let weigh = &timeline[2];
    assert_eq!(weigh.deployment, Some(deployment.id));
    assert_eq!(weigh.catch.as_ref(), Some(&counts));
    let shore = &timeline[4];
    assert!(shore.deployment.is_none());
    assert_eq!(shore.catch.as_ref(), Some(&counts));
    let build = &timeline[1];
    assert_eq!(build.deployment, Some(deployment.id));
    assert!(build.catch.is_none());
}

#[tokio::test]
async fn test_timeline_excludes_superseded_weighings() {
    let h = Harness::new();
    h.net("A-100").await;

    let session = h
        .session_ledger
        .start(&h.scope, SessionType::InlandWaters, h.coords(), None)
        .await
        .unwrap();
    h.catch_ledger
        .record_shore_weighing(
            &h.scope,
            h.coords(),
            None,
            [(h.pike, 2)].into_iter().collect(),
        )
        .await
        .unwrap();
    h.catch_ledger
        .record_shore_weighing(
            &h.scope,
            h.coords(),
            None,
            [(h.pike, 9)].into_iter().collect(),
        )
        .await
        .unwrap();

    let timeline = h.history.timeline(&h.scope, session.id).await.unwrap();
    let shore_entries: Vec<_> = timeline
        .iter()
        .filter(|e| e.kind == TimelineEntryKind::WeighOnShore)
        .collect();
    assert_eq!(shore_entries.len(), 1);
    assert_eq!(shore_entries[0].catch.as_ref().unwrap().get(h.pike), 9);
}

#[tokio::test]
async fn test_skipped_session_timeline_carries_note() {
    let h = Harness::new();

    let skipped = h
        .session_ledger
        .skip(
            &h.scope,
            SessionType::Polders,
            h.coords(),
            Some("pump maintenance".to_string()),
        )
        .await
        .unwrap();

    let timeline = h.history.timeline(&h.scope, skipped.id).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].kind, TimelineEntryKind::SkipFishing);
    assert_eq!(timeline[0].note.as_deref(), Some("pump maintenance"));
}

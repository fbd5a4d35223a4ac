// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! History Assembler
//!
//! Read-only merge of one session's START/END/SKIP events, BUILD/REMOVE
//! deployment events and current catch weighings into a single
//! chronologically ordered timeline. No side effects, no preconditions
//! beyond the session existing. Geometry is reprojected to the display
//! coordinate system on the way out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catch::CatchWeighing;
use crate::domain::deployment::{DeploymentEvent, DeploymentEventKind, GearDeploymentId};
use crate::domain::error::LedgerError;
use crate::domain::geo::{Coordinates, GeoProjector, LocationDescriptor};
use crate::domain::repository::{
    CatchWeighingRepository, DeploymentEventRepository, SessionEventRepository,
    SessionRepository,
};
use crate::domain::scope::OperatorScope;
use crate::domain::session::{SessionEvent, SessionEventKind, SessionId};
use crate::domain::species::SpeciesCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEntryKind {
    StartFishing,
    EndFishing,
    SkipFishing,
    BuildGear,
    RemoveGear,
    WeighOnBoat,
    WeighOnShore,
}

/// One row of the merged session timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub kind: TimelineEntryKind,
    pub timestamp: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub location: Option<LocationDescriptor>,
    pub note: Option<String>,
    pub deployment: Option<GearDeploymentId>,
    pub catch: Option<SpeciesCounts>,
}

pub struct HistoryAssembler {
    sessions: Arc<dyn SessionRepository>,
    session_events: Arc<dyn SessionEventRepository>,
    deployment_events: Arc<dyn DeploymentEventRepository>,
    weighings: Arc<dyn CatchWeighingRepository>,
    projector: Arc<dyn GeoProjector>,
}

impl HistoryAssembler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        session_events: Arc<dyn SessionEventRepository>,
        deployment_events: Arc<dyn DeploymentEventRepository>,
        weighings: Arc<dyn CatchWeighingRepository>,
        projector: Arc<dyn GeoProjector>,
    ) -> Self {
        Self {
            sessions,
            session_events,
            deployment_events,
            weighings,
            projector,
        }
    }

    /// The merged, time-ascending event list of one session.
    ///
    /// Superseded weighings are excluded; they stay reachable through the
    /// raw weighing listing for audit. Ties keep insertion order (the sort
    /// is stable).
    pub async fn timeline(
        &self,
        scope: &OperatorScope,
        session_id: SessionId,
    ) -> Result<Vec<TimelineEntry>, LedgerError> {
        let session = self
            .sessions
            .find_by_id(scope, session_id)
            .await?
            .ok_or(LedgerError::SessionNotFound(session_id))?;

        let lifecycle_ids: Vec<_> = [session.start_event, session.end_event, session.skip_event]
            .into_iter()
            .flatten()
            .collect();
        let lifecycle = self.session_events.find_by_ids(&lifecycle_ids).await?;

        let gear_events = self
            .deployment_events
            .find_for_session(
                session.id,
                &[DeploymentEventKind::Build, DeploymentEventKind::Remove],
            )
            .await?;

        let weighings = self
            .weighings
            .find_for_session(session.id, None, false)
            .await?;

        let mut entries = Vec::with_capacity(
            lifecycle.len() + gear_events.len() + weighings.len(),
        );
        for event in lifecycle {
            entries.push(self.session_entry(event)?);
        }
        for event in gear_events {
            if let Some(entry) = self.deployment_entry(event)? {
                entries.push(entry);
            }
        }
        for weighing in weighings {
            entries.push(self.weighing_entry(weighing)?);
        }

        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    fn session_entry(&self, event: SessionEvent) -> Result<TimelineEntry, LedgerError> {
        let kind = match event.kind {
            SessionEventKind::Start => TimelineEntryKind::StartFishing,
            SessionEventKind::End => TimelineEntryKind::EndFishing,
            SessionEventKind::Skip => TimelineEntryKind::SkipFishing,
        };
        Ok(TimelineEntry {
            id: event.id.0,
            kind,
            timestamp: event.created_at,
            coordinates: self.projector.to_display(event.geom)?,
            location: None,
            note: event.note,
            deployment: None,
            catch: None,
        })
    }

    fn deployment_entry(
        &self,
        event: DeploymentEvent,
    ) -> Result<Option<TimelineEntry>, LedgerError> {
        let kind = match event.kind {
            DeploymentEventKind::Build => TimelineEntryKind::BuildGear,
            DeploymentEventKind::Remove => TimelineEntryKind::RemoveGear,
            // WEIGH events mirror weighing rows; the timeline renders those
            // from the weighings themselves so superseded rows drop out.
            DeploymentEventKind::Weigh => return Ok(None),
        };
        Ok(Some(TimelineEntry {
            id: event.id.0,
            kind,
            timestamp: event.created_at,
            coordinates: self.projector.to_display(event.geom)?,
            location: event.location,
            note: None,
            deployment: event.deployment,
            catch: None,
        }))
    }

    fn weighing_entry(
        &self,
        weighing: CatchWeighing,
    ) -> Result<TimelineEntry, LedgerError> {
        let kind = match weighing.deployment {
            Some(_) => TimelineEntryKind::WeighOnBoat,
            None => TimelineEntryKind::WeighOnShore,
        };
        Ok(TimelineEntry {
            id: weighing.id.0,
            kind,
            timestamp: weighing.created_at,
            coordinates: self.projector.to_display(weighing.geom)?,
            location: weighing.location,
            note: None,
            deployment: weighing.deployment,
            catch: Some(weighing.counts),
        })
    }
}

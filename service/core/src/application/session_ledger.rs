// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Session Ledger Application Service
//!
//! Owns the session lifecycle: start, skip, end, and the "am I mid-session"
//! read every other ledger builds on. Coordinates:
//! - Domain layer: `Session` / `SessionEvent` aggregates
//! - Infrastructure layer: session, session-event, gear and weighing
//!   repositories, plus the coordinate projector
//!
//! The single-active-session rule rides on the repository's conditional
//! insert, so two racing `start` calls cannot both commit an open session.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::error::LedgerError;
use crate::domain::geo::{Coordinates, GeoProjector};
use crate::domain::repository::{
    CatchWeighingRepository, GearRepository, SessionEventRepository, SessionRepository,
};
use crate::domain::scope::OperatorScope;
use crate::domain::session::{
    CadastralId, Session, SessionEvent, SessionEventKind, SessionType,
};

pub struct SessionLedger {
    sessions: Arc<dyn SessionRepository>,
    session_events: Arc<dyn SessionEventRepository>,
    gear: Arc<dyn GearRepository>,
    weighings: Arc<dyn CatchWeighingRepository>,
    projector: Arc<dyn GeoProjector>,
}

impl SessionLedger {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        session_events: Arc<dyn SessionEventRepository>,
        gear: Arc<dyn GearRepository>,
        weighings: Arc<dyn CatchWeighingRepository>,
        projector: Arc<dyn GeoProjector>,
    ) -> Self {
        Self {
            sessions,
            session_events,
            gear,
            weighings,
            projector,
        }
    }

    /// Open a new session for the scope.
    ///
    /// Fails with `AlreadyActive` while another session is open, and with
    /// `NoGearAvailable` when the scope owns no gear at all. Estuary
    /// sessions ignore the caller's water body and pin the Curonian Lagoon
    /// cadastral id.
    ///
    /// Not blindly retryable: a retry after a timed-out call that did commit
    /// fails with `AlreadyActive` rather than opening a duplicate.
    pub async fn start(
        &self,
        scope: &OperatorScope,
        session_type: SessionType,
        coordinates: Coordinates,
        water_body: Option<CadastralId>,
    ) -> Result<Session, LedgerError> {
        if self.sessions.find_active(scope).await?.is_some() {
            return Err(LedgerError::AlreadyActive);
        }
        if self.gear.count(scope).await? == 0 {
            return Err(LedgerError::NoGearAvailable);
        }

        let water_body = match session_type {
            SessionType::Estuary => Some(CadastralId::curonian_lagoon()),
            _ => water_body,
        };

        let geom = self.projector.to_storage(coordinates)?;
        let event = SessionEvent::new(SessionEventKind::Start, geom, None, scope.clone());
        let session =
            Session::opened(scope.clone(), session_type, event.id, water_body);

        self.session_events.create(&event).await?;
        let created = self.sessions.create_if_none_active(&session).await?;
        if !created {
            // Lost the race between the check above and the insert: unwind
            // the orphan start event and report the session that won.
            warn!(%scope, "start raced an existing open session, unwinding");
            if let Err(cleanup) = self.session_events.soft_delete(event.id).await {
                return Err(LedgerError::RollbackFailed {
                    source: Box::new(LedgerError::AlreadyActive),
                    cleanup,
                });
            }
            return Err(LedgerError::AlreadyActive);
        }

        info!(%scope, session = %session.id, ?session_type, "session started");
        Ok(session)
    }

    /// Record "I chose not to fish" as a terminal session.
    ///
    /// No active-session precondition: skipping neither requires nor
    /// consumes an open session.
    pub async fn skip(
        &self,
        scope: &OperatorScope,
        session_type: SessionType,
        coordinates: Coordinates,
        note: Option<String>,
    ) -> Result<Session, LedgerError> {
        let geom = self.projector.to_storage(coordinates)?;
        let event = SessionEvent::new(SessionEventKind::Skip, geom, note, scope.clone());
        let session = Session::skipped(scope.clone(), session_type, event.id);

        self.session_events.create(&event).await?;
        if let Err(err) = self.sessions.create(&session).await {
            let source = Box::new(LedgerError::from(err));
            return match self.session_events.soft_delete(event.id).await {
                Ok(()) => Err(*source),
                Err(cleanup) => Err(LedgerError::RollbackFailed { source, cleanup }),
            };
        }

        info!(%scope, session = %session.id, ?session_type, "session skipped");
        Ok(session)
    }

    /// Close the scope's open session.
    ///
    /// Refused with `CatchNotWeighed` while per-deployment catch exists
    /// without a shore total, so a session can never close with unaccounted
    /// catch on board.
    pub async fn end(
        &self,
        scope: &OperatorScope,
        coordinates: Coordinates,
    ) -> Result<Session, LedgerError> {
        let mut session = self
            .sessions
            .find_active(scope)
            .await?
            .ok_or(LedgerError::NotStarted)?;

        if self.weighings.any_deployment_weighing(session.id).await?
            && !self.weighings.any_shore_weighing(session.id).await?
        {
            return Err(LedgerError::CatchNotWeighed);
        }

        let geom = self.projector.to_storage(coordinates)?;
        let event = SessionEvent::new(SessionEventKind::End, geom, None, scope.clone());
        self.session_events.create(&event).await?;

        session.close(event.id);
        if let Err(err) = self.sessions.update(&session).await {
            let source = Box::new(LedgerError::from(err));
            return match self.session_events.soft_delete(event.id).await {
                Ok(()) => Err(*source),
                Err(cleanup) => Err(LedgerError::RollbackFailed { source, cleanup }),
            };
        }

        info!(%scope, session = %session.id, "session ended");
        Ok(session)
    }

    /// The scope's open session, or `None`.
    pub async fn current_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Option<Session>, LedgerError> {
        debug!(%scope, "looking up active session");
        Ok(self.sessions.find_active(scope).await?)
    }
}

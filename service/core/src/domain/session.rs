// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::geo::GeoPoint;
use crate::domain::scope::OperatorScope;

/// Unique identifier for a fishing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a session lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionEventId(pub Uuid);

impl SessionEventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Regulated water-body classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Estuary,
    Polders,
    InlandWaters,
}

/// Cadastral reference of a registered body of water.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CadastralId(pub String);

/// Cadastral identifier of the Curonian Lagoon.
///
/// Estuary sessions always take place on the lagoon, so `start` force-sets
/// this id instead of trusting caller input.
pub const CURONIAN_LAGOON_CADASTRAL_ID: &str = "00050001";

impl CadastralId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn curonian_lagoon() -> Self {
        Self(CURONIAN_LAGOON_CADASTRAL_ID.to_string())
    }
}

impl std::fmt::Display for CadastralId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEventKind {
    Start,
    End,
    Skip,
}

/// Immutable session lifecycle fact.
///
/// Created once, never mutated, referenced by exactly one field of one
/// [`Session`]. Soft-deletion exists only to unwind an event whose owning
/// session write failed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub id: SessionEventId,
    pub kind: SessionEventKind,
    pub geom: GeoPoint,
    pub note: Option<String>,
    pub scope: OperatorScope,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SessionEvent {
    pub fn new(
        kind: SessionEventKind,
        geom: GeoPoint,
        note: Option<String>,
        scope: OperatorScope,
    ) -> Self {
        Self {
            id: SessionEventId::new(),
            kind,
            geom,
            note,
            scope,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

/// Current lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Open,
    Closed,
    Skipped,
}

/// One fishing outing.
///
/// A mutable "current state" row pointing at immutable [`SessionEvent`]
/// records, rather than state replayed from an event log. A session is
/// *open* (start set, end unset), *closed* (start and end set) or *skipped*
/// (skip set, start and end never set). Skipped sessions are created
/// terminal; they are not a transition from open. The only mutation ever
/// applied is attaching the end event. Rows are soft-deleted only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub scope: OperatorScope,
    pub session_type: SessionType,
    pub start_event: Option<SessionEventId>,
    pub end_event: Option<SessionEventId>,
    pub skip_event: Option<SessionEventId>,
    pub water_body: Option<CadastralId>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session opened by a START event.
    pub fn opened(
        scope: OperatorScope,
        session_type: SessionType,
        start_event: SessionEventId,
        water_body: Option<CadastralId>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            scope,
            session_type,
            start_event: Some(start_event),
            end_event: None,
            skip_event: None,
            water_body,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// A terminal session recording that the operator chose not to fish.
    pub fn skipped(
        scope: OperatorScope,
        session_type: SessionType,
        skip_event: SessionEventId,
    ) -> Self {
        Self {
            id: SessionId::new(),
            scope,
            session_type,
            start_event: None,
            end_event: None,
            skip_event: Some(skip_event),
            water_body: None,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.start_event.is_some() && self.end_event.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.start_event.is_some() && self.end_event.is_some()
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_event.is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_skipped() {
            SessionState::Skipped
        } else if self.is_open() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Attach the END event, closing the session.
    pub fn close(&mut self, end_event: SessionEventId) {
        self.end_event = Some(end_event);
    }
}

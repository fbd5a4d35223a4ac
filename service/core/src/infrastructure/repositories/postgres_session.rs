// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL Session Repositories
//!
//! `SessionRepository` / `SessionEventRepository` implementations backed by
//! the `sessions` and `session_events` tables. The single-active-session
//! rule rides on the conditional `INSERT … WHERE NOT EXISTS` in
//! `create_if_none_active`, atomic at statement level, so two racing starts
//! cannot both commit an open session for one scope.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::geo::GeoPoint;
use crate::domain::repository::{
    RepositoryError, SessionEventRepository, SessionRepository,
};
use crate::domain::scope::{OperatorId, OperatorScope, TenantId};
use crate::domain::session::{
    CadastralId, Session, SessionEvent, SessionEventId, SessionEventKind, SessionId,
    SessionType,
};

// Scope predicate shared by every query here: tenant scope matches on the
// tenant alone, personal scope matches tenant-less rows of the operator.
const SCOPE_PREDICATE: &str = "(($1::uuid IS NULL AND tenant_id IS NULL AND operator_id = $2) \
     OR ($1::uuid IS NOT NULL AND tenant_id = $1))";

fn scope_binds(scope: &OperatorScope) -> (Option<Uuid>, Uuid) {
    (scope.tenant.map(|t| t.0), scope.operator.0)
}

fn session_type_to_str(session_type: SessionType) -> &'static str {
    match session_type {
        SessionType::Estuary => "ESTUARY",
        SessionType::Polders => "POLDERS",
        SessionType::InlandWaters => "INLAND_WATERS",
    }
}

fn session_type_from_str(s: &str) -> Result<SessionType, RepositoryError> {
    match s {
        "ESTUARY" => Ok(SessionType::Estuary),
        "POLDERS" => Ok(SessionType::Polders),
        "INLAND_WATERS" => Ok(SessionType::InlandWaters),
        other => Err(RepositoryError::Serialization(format!(
            "Unknown session type: {}",
            other
        ))),
    }
}

fn row_to_session(row: &sqlx::postgres::PgRow) -> Result<Session, RepositoryError> {
    let tenant: Option<Uuid> = row.get("tenant_id");
    let session_type: String = row.get("session_type");
    let water_body: Option<String> = row.get("water_body");

    Ok(Session {
        id: SessionId(row.get("id")),
        scope: OperatorScope {
            operator: OperatorId(row.get("operator_id")),
            tenant: tenant.map(TenantId),
        },
        session_type: session_type_from_str(&session_type)?,
        start_event: row
            .get::<Option<Uuid>, _>("start_event_id")
            .map(SessionEventId),
        end_event: row
            .get::<Option<Uuid>, _>("end_event_id")
            .map(SessionEventId),
        skip_event: row
            .get::<Option<Uuid>, _>("skip_event_id")
            .map(SessionEventId),
        water_body: water_body.map(CadastralId),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    })
}

pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, operator_id, tenant_id, session_type,
                start_event_id, end_event_id, skip_event_id,
                water_body, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(session.id.0)
        .bind(session.scope.operator.0)
        .bind(session.scope.tenant.map(|t| t.0))
        .bind(session_type_to_str(session.session_type))
        .bind(session.start_event.map(|e| e.0))
        .bind(session.end_event.map(|e| e.0))
        .bind(session.skip_event.map(|e| e.0))
        .bind(session.water_body.as_ref().map(|w| w.0.clone()))
        .bind(session.created_at)
        .bind(session.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to create session: {}", e)))?;

        Ok(())
    }

    async fn create_if_none_active(
        &self,
        session: &Session,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO sessions (
                id, operator_id, tenant_id, session_type,
                start_event_id, end_event_id, skip_event_id,
                water_body, created_at, deleted_at
            )
            SELECT $3, $2, $1, $4, $5, $6, $7, $8, $9, $10
            WHERE NOT EXISTS (
                SELECT 1 FROM sessions
                WHERE {SCOPE_PREDICATE}
                  AND start_event_id IS NOT NULL
                  AND end_event_id IS NULL
                  AND deleted_at IS NULL
            )
            "#
        ))
        .bind(session.scope.tenant.map(|t| t.0))
        .bind(session.scope.operator.0)
        .bind(session.id.0)
        .bind(session_type_to_str(session.session_type))
        .bind(session.start_event.map(|e| e.0))
        .bind(session.end_event.map(|e| e.0))
        .bind(session.skip_event.map(|e| e.0))
        .bind(session.water_body.as_ref().map(|w| w.0.clone()))
        .bind(session.created_at)
        .bind(session.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to create session: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, session: &Session) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                start_event_id = $2,
                end_event_id = $3,
                skip_event_id = $4,
                water_body = $5,
                deleted_at = $6
            WHERE id = $1
            "#,
        )
        .bind(session.id.0)
        .bind(session.start_event.map(|e| e.0))
        .bind(session.end_event.map(|e| e.0))
        .bind(session.skip_event.map(|e| e.0))
        .bind(session.water_body.as_ref().map(|w| w.0.clone()))
        .bind(session.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to update session: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Session {}",
                session.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: SessionId,
    ) -> Result<Option<Session>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let row = sqlx::query(&format!(
            r#"
            SELECT id, operator_id, tenant_id, session_type,
                   start_event_id, end_event_id, skip_event_id,
                   water_body, created_at, deleted_at
            FROM sessions
            WHERE id = $3 AND deleted_at IS NULL AND {SCOPE_PREDICATE}
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Option<Session>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let row = sqlx::query(&format!(
            r#"
            SELECT id, operator_id, tenant_id, session_type,
                   start_event_id, end_event_id, skip_event_id,
                   water_body, created_at, deleted_at
            FROM sessions
            WHERE {SCOPE_PREDICATE}
              AND start_event_id IS NOT NULL
              AND end_event_id IS NULL
              AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_session).transpose()
    }
}

pub struct PostgresSessionEventRepository {
    pool: PgPool,
}

impl PostgresSessionEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn event_kind_to_str(kind: SessionEventKind) -> &'static str {
    match kind {
        SessionEventKind::Start => "START",
        SessionEventKind::End => "END",
        SessionEventKind::Skip => "SKIP",
    }
}

fn event_kind_from_str(s: &str) -> Result<SessionEventKind, RepositoryError> {
    match s {
        "START" => Ok(SessionEventKind::Start),
        "END" => Ok(SessionEventKind::End),
        "SKIP" => Ok(SessionEventKind::Skip),
        other => Err(RepositoryError::Serialization(format!(
            "Unknown session event kind: {}",
            other
        ))),
    }
}

#[async_trait]
impl SessionEventRepository for PostgresSessionEventRepository {
    async fn create(&self, event: &SessionEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO session_events (
                id, kind, geom_x, geom_y, note,
                operator_id, tenant_id, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id.0)
        .bind(event_kind_to_str(event.kind))
        .bind(event.geom.x)
        .bind(event.geom.y)
        .bind(event.note.clone())
        .bind(event.scope.operator.0)
        .bind(event.scope.tenant.map(|t| t.0))
        .bind(event.created_at)
        .bind(event.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::Database(format!("Failed to create session event: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_ids(
        &self,
        ids: &[SessionEventId],
    ) -> Result<Vec<SessionEvent>, RepositoryError> {
        let raw_ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, kind, geom_x, geom_y, note,
                   operator_id, tenant_id, created_at, deleted_at
            FROM session_events
            WHERE id = ANY($1) AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.get("kind");
            let tenant: Option<Uuid> = row.get("tenant_id");
            events.push(SessionEvent {
                id: SessionEventId(row.get("id")),
                kind: event_kind_from_str(&kind)?,
                geom: GeoPoint {
                    x: row.get("geom_x"),
                    y: row.get("geom_y"),
                },
                note: row.get("note"),
                scope: OperatorScope {
                    operator: OperatorId(row.get("operator_id")),
                    tenant: tenant.map(TenantId),
                },
                created_at: row.get::<DateTime<Utc>, _>("created_at"),
                deleted_at: row.get("deleted_at"),
            });
        }
        Ok(events)
    }

    async fn soft_delete(&self, id: SessionEventId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE session_events SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Session event {}", id)));
        }
        Ok(())
    }
}

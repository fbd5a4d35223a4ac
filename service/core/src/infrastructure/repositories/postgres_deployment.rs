// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL Deployment Repositories
//!
//! `DeploymentRepository` / `DeploymentEventRepository` implementations over
//! the `gear_deployments` and `deployment_events` tables. Deployment gear
//! lists are `uuid[]` columns; location snapshots and catch payloads are
//! JSONB.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::deployment::{
    DeploymentEvent, DeploymentEventId, DeploymentEventKind, GearDeployment,
    GearDeploymentId,
};
use crate::domain::gear::GearId;
use crate::domain::geo::GeoPoint;
use crate::domain::repository::{
    DeploymentEventRepository, DeploymentRepository, RepositoryError,
};
use crate::domain::scope::{OperatorId, OperatorScope, TenantId};
use crate::domain::session::SessionId;

const SCOPE_PREDICATE: &str = "(($1::uuid IS NULL AND tenant_id IS NULL AND operator_id = $2) \
     OR ($1::uuid IS NOT NULL AND tenant_id = $1))";

fn scope_binds(scope: &OperatorScope) -> (Option<Uuid>, Uuid) {
    (scope.tenant.map(|t| t.0), scope.operator.0)
}

fn row_to_deployment(
    row: &sqlx::postgres::PgRow,
) -> Result<GearDeployment, RepositoryError> {
    let tenant: Option<Uuid> = row.get("tenant_id");
    let gear: Vec<Uuid> = row.get("gear_ids");

    Ok(GearDeployment {
        id: GearDeploymentId(row.get("id")),
        gear: gear.into_iter().map(GearId).collect(),
        build_event: DeploymentEventId(row.get("build_event_id")),
        remove_event: row
            .get::<Option<Uuid>, _>("remove_event_id")
            .map(DeploymentEventId),
        scope: OperatorScope {
            operator: OperatorId(row.get("operator_id")),
            tenant: tenant.map(TenantId),
        },
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    })
}

pub struct PostgresDeploymentRepository {
    pool: PgPool,
}

impl PostgresDeploymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentRepository for PostgresDeploymentRepository {
    async fn create(&self, deployment: &GearDeployment) -> Result<(), RepositoryError> {
        let gear: Vec<Uuid> = deployment.gear.iter().map(|g| g.0).collect();

        sqlx::query(
            r#"
            INSERT INTO gear_deployments (
                id, gear_ids, build_event_id, remove_event_id,
                operator_id, tenant_id, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(deployment.id.0)
        .bind(gear)
        .bind(deployment.build_event.0)
        .bind(deployment.remove_event.map(|e| e.0))
        .bind(deployment.scope.operator.0)
        .bind(deployment.scope.tenant.map(|t| t.0))
        .bind(deployment.created_at)
        .bind(deployment.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::Database(format!("Failed to create deployment: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, deployment: &GearDeployment) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE gear_deployments SET
                remove_event_id = $2,
                deleted_at = $3
            WHERE id = $1
            "#,
        )
        .bind(deployment.id.0)
        .bind(deployment.remove_event.map(|e| e.0))
        .bind(deployment.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::Database(format!("Failed to update deployment: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Deployment {}",
                deployment.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<Option<GearDeployment>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let row = sqlx::query(&format!(
            r#"
            SELECT id, gear_ids, build_event_id, remove_event_id,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear_deployments
            WHERE id = $3 AND deleted_at IS NULL AND {SCOPE_PREDICATE}
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_deployment).transpose()
    }

    async fn find_active(
        &self,
        scope: &OperatorScope,
    ) -> Result<Vec<GearDeployment>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, gear_ids, build_event_id, remove_event_id,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear_deployments
            WHERE remove_event_id IS NULL AND deleted_at IS NULL AND {SCOPE_PREDICATE}
            ORDER BY created_at ASC
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_deployment).collect()
    }

    async fn find_active_containing_gear(
        &self,
        scope: &OperatorScope,
        gear: &[GearId],
    ) -> Result<Vec<GearDeployment>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let raw_ids: Vec<Uuid> = gear.iter().map(|g| g.0).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, gear_ids, build_event_id, remove_event_id,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear_deployments
            WHERE remove_event_id IS NULL
              AND deleted_at IS NULL
              AND gear_ids && $3
              AND {SCOPE_PREDICATE}
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_deployment).collect()
    }

    async fn delete(
        &self,
        scope: &OperatorScope,
        id: GearDeploymentId,
    ) -> Result<(), RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        sqlx::query(&format!(
            "DELETE FROM gear_deployments WHERE id = $3 AND {SCOPE_PREDICATE}"
        ))
        .bind(tenant)
        .bind(operator)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }
}

fn event_kind_to_str(kind: DeploymentEventKind) -> &'static str {
    match kind {
        DeploymentEventKind::Build => "BUILD",
        DeploymentEventKind::Remove => "REMOVE",
        DeploymentEventKind::Weigh => "WEIGH",
    }
}

fn event_kind_from_str(s: &str) -> Result<DeploymentEventKind, RepositoryError> {
    match s {
        "BUILD" => Ok(DeploymentEventKind::Build),
        "REMOVE" => Ok(DeploymentEventKind::Remove),
        "WEIGH" => Ok(DeploymentEventKind::Weigh),
        other => Err(RepositoryError::Serialization(format!(
            "Unknown deployment event kind: {}",
            other
        ))),
    }
}

fn row_to_event(row: &sqlx::postgres::PgRow) -> Result<DeploymentEvent, RepositoryError> {
    let kind: String = row.get("kind");
    let tenant: Option<Uuid> = row.get("tenant_id");
    let location: Option<serde_json::Value> = row.get("location");
    let catch: Option<serde_json::Value> = row.get("catch");

    Ok(DeploymentEvent {
        id: DeploymentEventId(row.get("id")),
        kind: event_kind_from_str(&kind)?,
        geom: GeoPoint {
            x: row.get("geom_x"),
            y: row.get("geom_y"),
        },
        location: location.map(serde_json::from_value).transpose()?,
        session: SessionId(row.get("session_id")),
        deployment: row
            .get::<Option<Uuid>, _>("deployment_id")
            .map(GearDeploymentId),
        catch: catch.map(serde_json::from_value).transpose()?,
        scope: OperatorScope {
            operator: OperatorId(row.get("operator_id")),
            tenant: tenant.map(TenantId),
        },
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    })
}

pub struct PostgresDeploymentEventRepository {
    pool: PgPool,
}

impl PostgresDeploymentEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentEventRepository for PostgresDeploymentEventRepository {
    async fn create(&self, event: &DeploymentEvent) -> Result<(), RepositoryError> {
        let location = event
            .location
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let catch = event.catch.as_ref().map(serde_json::to_value).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO deployment_events (
                id, kind, geom_x, geom_y, location,
                session_id, deployment_id, catch,
                operator_id, tenant_id, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(event.id.0)
        .bind(event_kind_to_str(event.kind))
        .bind(event.geom.x)
        .bind(event.geom.y)
        .bind(location)
        .bind(event.session.0)
        .bind(event.deployment.map(|d| d.0))
        .bind(catch)
        .bind(event.scope.operator.0)
        .bind(event.scope.tenant.map(|t| t.0))
        .bind(event.created_at)
        .bind(event.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::Database(format!("Failed to create deployment event: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_ids(
        &self,
        ids: &[DeploymentEventId],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError> {
        let raw_ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, kind, geom_x, geom_y, location,
                   session_id, deployment_id, catch,
                   operator_id, tenant_id, created_at, deleted_at
            FROM deployment_events
            WHERE id = ANY($1) AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }

    async fn find_for_session(
        &self,
        session: SessionId,
        kinds: &[DeploymentEventKind],
    ) -> Result<Vec<DeploymentEvent>, RepositoryError> {
        let kind_strs: Vec<&str> = kinds.iter().map(|k| event_kind_to_str(*k)).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, kind, geom_x, geom_y, location,
                   session_id, deployment_id, catch,
                   operator_id, tenant_id, created_at, deleted_at
            FROM deployment_events
            WHERE session_id = $1 AND kind = ANY($2) AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(session.0)
        .bind(kind_strs)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_event).collect()
    }

    async fn soft_delete(&self, id: DeploymentEventId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE deployment_events SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Deployment event {}",
                id
            )));
        }
        Ok(())
    }
}

// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL Catch Weighing Repository
//!
//! `CatchWeighingRepository` over the `catch_weighings` table. The
//! supersede-on-insert contract is one CTE statement: the UPDATE marking
//! prior rows for the same (session, deployment) key superseded and the
//! INSERT of the new row commit atomically, so no read can observe two
//! current rows for one key written through here.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::catch::{CatchWeighing, CatchWeighingId};
use crate::domain::deployment::GearDeploymentId;
use crate::domain::geo::GeoPoint;
use crate::domain::repository::{CatchWeighingRepository, RepositoryError};
use crate::domain::scope::{OperatorId, OperatorScope, TenantId};
use crate::domain::session::SessionId;

fn row_to_weighing(
    row: &sqlx::postgres::PgRow,
) -> Result<CatchWeighing, RepositoryError> {
    let tenant: Option<Uuid> = row.get("tenant_id");
    let counts: serde_json::Value = row.get("counts");
    let location: Option<serde_json::Value> = row.get("location");

    Ok(CatchWeighing {
        id: CatchWeighingId(row.get("id")),
        session: SessionId(row.get("session_id")),
        deployment: row
            .get::<Option<Uuid>, _>("deployment_id")
            .map(GearDeploymentId),
        counts: serde_json::from_value(counts)?,
        geom: GeoPoint {
            x: row.get("geom_x"),
            y: row.get("geom_y"),
        },
        location: location.map(serde_json::from_value).transpose()?,
        scope: OperatorScope {
            operator: OperatorId(row.get("operator_id")),
            tenant: tenant.map(TenantId),
        },
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    })
}

pub struct PostgresCatchWeighingRepository {
    pool: PgPool,
}

impl PostgresCatchWeighingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatchWeighingRepository for PostgresCatchWeighingRepository {
    async fn insert_superseding(
        &self,
        weighing: &CatchWeighing,
    ) -> Result<(), RepositoryError> {
        let counts = serde_json::to_value(&weighing.counts)?;
        let location = weighing
            .location
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            WITH superseded AS (
                UPDATE catch_weighings
                SET deleted_at = NOW()
                WHERE session_id = $2
                  AND deployment_id IS NOT DISTINCT FROM $3
                  AND deleted_at IS NULL
            )
            INSERT INTO catch_weighings (
                id, session_id, deployment_id, counts,
                geom_x, geom_y, location,
                operator_id, tenant_id, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(weighing.id.0)
        .bind(weighing.session.0)
        .bind(weighing.deployment.map(|d| d.0))
        .bind(counts)
        .bind(weighing.geom.x)
        .bind(weighing.geom.y)
        .bind(location)
        .bind(weighing.scope.operator.0)
        .bind(weighing.scope.tenant.map(|t| t.0))
        .bind(weighing.created_at)
        .bind(weighing.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            RepositoryError::Database(format!("Failed to insert weighing: {}", e))
        })?;

        Ok(())
    }

    async fn find_for_session(
        &self,
        session: SessionId,
        deployment: Option<GearDeploymentId>,
        include_superseded: bool,
    ) -> Result<Vec<CatchWeighing>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, deployment_id, counts,
                   geom_x, geom_y, location,
                   operator_id, tenant_id, created_at, deleted_at
            FROM catch_weighings
            WHERE session_id = $1
              AND ($2::uuid IS NULL OR deployment_id = $2)
              AND ($3 OR deleted_at IS NULL)
            ORDER BY created_at DESC
            "#,
        )
        .bind(session.0)
        .bind(deployment.map(|d| d.0))
        .bind(include_superseded)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_weighing).collect()
    }

    async fn any_deployment_weighing(
        &self,
        session: SessionId,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM catch_weighings
                WHERE session_id = $1
                  AND deployment_id IS NOT NULL
                  AND deleted_at IS NULL
            ) AS present
            "#,
        )
        .bind(session.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(row.get("present"))
    }

    async fn any_shore_weighing(
        &self,
        session: SessionId,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM catch_weighings
                WHERE session_id = $1
                  AND deployment_id IS NULL
                  AND deleted_at IS NULL
            ) AS present
            "#,
        )
        .bind(session.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(row.get("present"))
    }

    async fn delete(&self, id: CatchWeighingId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM catch_weighings WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }
}

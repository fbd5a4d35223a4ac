// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL Gear & Catalog Repositories
//!
//! `GearRepository`, `GearTypeRepository` and `SpeciesRepository`
//! implementations over the `gear`, `gear_types` and `species` tables.
//! Calibration and photo payloads live in JSONB columns and round-trip
//! through `serde_json`.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::gear::{Gear, GearCategory, GearId, GearType, GearTypeId};
use crate::domain::repository::{
    GearRepository, GearTypeRepository, RepositoryError, SpeciesRepository,
};
use crate::domain::scope::{OperatorId, OperatorScope, TenantId};
use crate::domain::species::{Species, SpeciesId};

const SCOPE_PREDICATE: &str = "(($1::uuid IS NULL AND tenant_id IS NULL AND operator_id = $2) \
     OR ($1::uuid IS NOT NULL AND tenant_id = $1))";

fn scope_binds(scope: &OperatorScope) -> (Option<Uuid>, Uuid) {
    (scope.tenant.map(|t| t.0), scope.operator.0)
}

fn row_to_gear(row: &sqlx::postgres::PgRow) -> Result<Gear, RepositoryError> {
    let tenant: Option<Uuid> = row.get("tenant_id");
    let calibration: serde_json::Value = row.get("calibration");
    let eye_size: i32 = row.get("eye_size_mm");

    Ok(Gear {
        id: GearId(row.get("id")),
        seal_number: row.get("seal_number"),
        gear_type: GearTypeId(row.get("gear_type_id")),
        eye_size_mm: eye_size as u32,
        calibration: serde_json::from_value(calibration)?,
        scope: OperatorScope {
            operator: OperatorId(row.get("operator_id")),
            tenant: tenant.map(TenantId),
        },
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    })
}

pub struct PostgresGearRepository {
    pool: PgPool,
}

impl PostgresGearRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GearRepository for PostgresGearRepository {
    async fn create(&self, gear: &Gear) -> Result<(), RepositoryError> {
        let calibration = serde_json::to_value(gear.calibration)?;

        sqlx::query(
            r#"
            INSERT INTO gear (
                id, seal_number, gear_type_id, eye_size_mm, calibration,
                operator_id, tenant_id, created_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(gear.id.0)
        .bind(&gear.seal_number)
        .bind(gear.gear_type.0)
        .bind(gear.eye_size_mm as i32)
        .bind(calibration)
        .bind(gear.scope.operator.0)
        .bind(gear.scope.tenant.map(|t| t.0))
        .bind(gear.created_at)
        .bind(gear.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to create gear: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<Option<Gear>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let row = sqlx::query(&format!(
            r#"
            SELECT id, seal_number, gear_type_id, eye_size_mm, calibration,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear
            WHERE id = $3 AND deleted_at IS NULL AND {SCOPE_PREDICATE}
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_gear).transpose()
    }

    async fn find_by_ids(
        &self,
        scope: &OperatorScope,
        ids: &[GearId],
    ) -> Result<Vec<Gear>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let raw_ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, seal_number, gear_type_id, eye_size_mm, calibration,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear
            WHERE id = ANY($3) AND deleted_at IS NULL AND {SCOPE_PREDICATE}
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_gear).collect()
    }

    async fn list(&self, scope: &OperatorScope) -> Result<Vec<Gear>, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, seal_number, gear_type_id, eye_size_mm, calibration,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear
            WHERE deleted_at IS NULL AND {SCOPE_PREDICATE}
            ORDER BY created_at ASC
            "#
        ))
        .bind(tenant)
        .bind(operator)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_gear).collect()
    }

    async fn count(&self, scope: &OperatorScope) -> Result<u64, RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM gear WHERE deleted_at IS NULL AND {SCOPE_PREDICATE}"
        ))
        .bind(tenant)
        .bind(operator)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let total: i64 = row.get("total");
        Ok(total as u64)
    }

    async fn find_by_seal_number(
        &self,
        seal_number: &str,
    ) -> Result<Option<Gear>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, seal_number, gear_type_id, eye_size_mm, calibration,
                   operator_id, tenant_id, created_at, deleted_at
            FROM gear
            WHERE seal_number = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(seal_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.as_ref().map(row_to_gear).transpose()
    }

    async fn soft_delete(
        &self,
        scope: &OperatorScope,
        id: GearId,
    ) -> Result<(), RepositoryError> {
        let (tenant, operator) = scope_binds(scope);
        let result = sqlx::query(&format!(
            "UPDATE gear SET deleted_at = NOW() \
             WHERE id = $3 AND deleted_at IS NULL AND {SCOPE_PREDICATE}"
        ))
        .bind(tenant)
        .bind(operator)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Gear {}", id)));
        }
        Ok(())
    }
}

fn category_to_str(category: GearCategory) -> &'static str {
    match category {
        GearCategory::Net => "NET",
        GearCategory::Catcher => "CATCHER",
    }
}

fn category_from_str(s: &str) -> Result<GearCategory, RepositoryError> {
    match s {
        "NET" => Ok(GearCategory::Net),
        "CATCHER" => Ok(GearCategory::Catcher),
        other => Err(RepositoryError::Serialization(format!(
            "Unknown gear category: {}",
            other
        ))),
    }
}

pub struct PostgresGearTypeRepository {
    pool: PgPool,
}

impl PostgresGearTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seed helper used by deploy tooling.
    pub async fn insert(&self, gear_type: &GearType) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO gear_types (id, label, category) VALUES ($1, $2, $3)")
            .bind(gear_type.id.0)
            .bind(&gear_type.label)
            .bind(category_to_str(gear_type.category))
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl GearTypeRepository for PostgresGearTypeRepository {
    async fn find_by_id(
        &self,
        id: GearTypeId,
    ) -> Result<Option<GearType>, RepositoryError> {
        let row = sqlx::query("SELECT id, label, category FROM gear_types WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        match row {
            Some(row) => {
                let category: String = row.get("category");
                Ok(Some(GearType {
                    id: GearTypeId(row.get("id")),
                    label: row.get("label"),
                    category: category_from_str(&category)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<GearType>, RepositoryError> {
        let rows =
            sqlx::query("SELECT id, label, category FROM gear_types ORDER BY label ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut types = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.get("category");
            types.push(GearType {
                id: GearTypeId(row.get("id")),
                label: row.get("label"),
                category: category_from_str(&category)?,
            });
        }
        Ok(types)
    }
}

pub struct PostgresSpeciesRepository {
    pool: PgPool,
}

impl PostgresSpeciesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_species(row: &sqlx::postgres::PgRow) -> Result<Species, RepositoryError> {
    let photo: Option<serde_json::Value> = row.get("photo");
    Ok(Species {
        id: SpeciesId(row.get("id")),
        label: row.get("label"),
        priority: row.get("priority"),
        photo: photo.map(serde_json::from_value).transpose()?,
    })
}

#[async_trait]
impl SpeciesRepository for PostgresSpeciesRepository {
    async fn find_by_ids(
        &self,
        ids: &[SpeciesId],
    ) -> Result<Vec<Species>, RepositoryError> {
        let raw_ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, label, priority, photo
            FROM species
            WHERE id = ANY($1) AND deleted_at IS NULL
            "#,
        )
        .bind(raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_species).collect()
    }

    async fn list(&self) -> Result<Vec<Species>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, label, priority, photo FROM species WHERE deleted_at IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_species).collect()
    }
}

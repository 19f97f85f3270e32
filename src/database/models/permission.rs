use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::access::{AccessLevel, PermissionStatus, Role};
use crate::database::manager::DatabaseError;
use crate::database::models::patient::PatientProfile;

/// Caregiver grant on one patient profile. At most one row exists per
/// (patient_profile_id, caregiver_id) pair, enforced by a unique index
/// and the upsert used at invite redemption.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub caregiver_id: Uuid,
    pub status: PermissionStatus,
    pub level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grant row joined with the caregiver's public identity, for the owning
/// patient's permission list
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PermissionWithCaregiver {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub caregiver_id: Uuid,
    pub status: PermissionStatus,
    pub level: AccessLevel,
    pub caregiver_email: String,
    pub caregiver_name: Option<String>,
    pub caregiver_role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Status and level of the unique grant for (profile, caregiver), if one
    /// exists. The access evaluator's caregiver-side lookup.
    pub async fn grant_for(
        pool: &PgPool,
        patient_profile_id: Uuid,
        caregiver_id: Uuid,
    ) -> Result<Option<(PermissionStatus, AccessLevel)>, DatabaseError> {
        let grant: Option<(PermissionStatus, AccessLevel)> = sqlx::query_as(
            "SELECT status, level FROM permissions
             WHERE patient_profile_id = $1 AND caregiver_id = $2",
        )
        .bind(patient_profile_id)
        .bind(caregiver_id)
        .fetch_optional(pool)
        .await?;
        Ok(grant)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Permission>, DatabaseError> {
        let perm = sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(perm)
    }

    /// Redeeming an invite (re)sets the pair's grant to PENDING. Level is
    /// READ on first creation and left untouched on an existing row.
    pub async fn upsert_pending(
        tx: &mut Transaction<'_, Postgres>,
        patient_profile_id: Uuid,
        caregiver_id: Uuid,
    ) -> Result<Permission, DatabaseError> {
        let perm = sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (patient_profile_id, caregiver_id, status, level)
             VALUES ($1, $2, 'PENDING', 'READ')
             ON CONFLICT (patient_profile_id, caregiver_id)
             DO UPDATE SET status = 'PENDING', updated_at = now()
             RETURNING *",
        )
        .bind(patient_profile_id)
        .bind(caregiver_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(perm)
    }

    /// Partial update; only the owning patient may call this (checked by the
    /// handler before acting)
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        status: Option<PermissionStatus>,
        level: Option<AccessLevel>,
    ) -> Result<Permission, DatabaseError> {
        let perm = sqlx::query_as::<_, Permission>(
            "UPDATE permissions
             SET status = COALESCE($2, status),
                 level = COALESCE($3, level),
                 updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(level)
        .fetch_one(pool)
        .await?;
        Ok(perm)
    }

    pub async fn list_for_patient(
        pool: &PgPool,
        patient_profile_id: Uuid,
    ) -> Result<Vec<PermissionWithCaregiver>, DatabaseError> {
        let grants = sqlx::query_as::<_, PermissionWithCaregiver>(
            "SELECT p.id, p.patient_profile_id, p.caregiver_id, p.status, p.level,
                    u.email AS caregiver_email, u.name AS caregiver_name,
                    u.role AS caregiver_role,
                    p.created_at, p.updated_at
             FROM permissions p
             JOIN users u ON u.id = p.caregiver_id
             WHERE p.patient_profile_id = $1
             ORDER BY p.created_at",
        )
        .bind(patient_profile_id)
        .fetch_all(pool)
        .await?;
        Ok(grants)
    }

    /// Patient profiles a caregiver holds an ACCEPTED grant on
    pub async fn accepted_profiles_for_caregiver(
        pool: &PgPool,
        caregiver_id: Uuid,
    ) -> Result<Vec<PatientProfile>, DatabaseError> {
        let profiles = sqlx::query_as::<_, PatientProfile>(
            "SELECT pp.*
             FROM permissions p
             JOIN patient_profiles pp ON pp.id = p.patient_profile_id
             WHERE p.caregiver_id = $1 AND p.status = 'ACCEPTED'
             ORDER BY pp.created_at",
        )
        .bind(caregiver_id)
        .fetch_all(pool)
        .await?;
        Ok(profiles)
    }
}

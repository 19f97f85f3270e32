use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub allergies: Option<String>,
    pub reactions: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_contact: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a patient may set on themselves
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfileData {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub allergies: Option<String>,
    pub reactions: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_contact: Option<String>,
    pub photo_url: Option<String>,
}

impl PatientProfile {
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<PatientProfile>, DatabaseError> {
        let profile =
            sqlx::query_as::<_, PatientProfile>("SELECT * FROM patient_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(profile)
    }

    pub async fn find_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<PatientProfile>, DatabaseError> {
        let profile = sqlx::query_as::<_, PatientProfile>(
            "SELECT * FROM patient_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(profile)
    }

    /// Owning user id of a profile, or None when the profile does not exist.
    /// The access evaluator's only patient-side lookup.
    pub async fn owner_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM patient_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(owner.map(|(user_id,)| user_id))
    }

    /// Empty profile created at registration time for patient accounts
    pub async fn create_empty(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<PatientProfile, DatabaseError> {
        let profile = sqlx::query_as::<_, PatientProfile>(
            "INSERT INTO patient_profiles (user_id) VALUES ($1) RETURNING *",
        )
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(profile)
    }

    /// Full-replace upsert keyed by the owning user
    pub async fn upsert_for_user(
        pool: &PgPool,
        user_id: Uuid,
        data: &PatientProfileData,
    ) -> Result<PatientProfile, DatabaseError> {
        let profile = sqlx::query_as::<_, PatientProfile>(
            "INSERT INTO patient_profiles
                 (user_id, name, age, weight, height, allergies, reactions,
                  doctor_name, doctor_contact, photo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (user_id) DO UPDATE SET
                 name = EXCLUDED.name,
                 age = EXCLUDED.age,
                 weight = EXCLUDED.weight,
                 height = EXCLUDED.height,
                 allergies = EXCLUDED.allergies,
                 reactions = EXCLUDED.reactions,
                 doctor_name = EXCLUDED.doctor_name,
                 doctor_contact = EXCLUDED.doctor_contact,
                 photo_url = EXCLUDED.photo_url,
                 updated_at = now()
             RETURNING *",
        )
        .bind(user_id)
        .bind(&data.name)
        .bind(data.age)
        .bind(data.weight)
        .bind(data.height)
        .bind(&data.allergies)
        .bind(&data.reactions)
        .bind(&data.doctor_name)
        .bind(&data.doctor_contact)
        .bind(&data.photo_url)
        .fetch_one(pool)
        .await?;
        Ok(profile)
    }
}

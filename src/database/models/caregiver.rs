use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub birth_date: Option<DateTime<Utc>>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_relation: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub relationship: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverProfileData {
    /// Display name lives on the users table, not the profile row
    pub name: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_relation: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub relationship: Option<String>,
    pub photo_url: Option<String>,
}

impl CaregiverProfile {
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<CaregiverProfile>, DatabaseError> {
        let profile = sqlx::query_as::<_, CaregiverProfile>(
            "SELECT * FROM caregiver_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(profile)
    }

    pub async fn upsert_for_user(
        pool: &PgPool,
        user_id: Uuid,
        data: &CaregiverProfileData,
    ) -> Result<CaregiverProfile, DatabaseError> {
        let profile = sqlx::query_as::<_, CaregiverProfile>(
            "INSERT INTO caregiver_profiles
                 (user_id, birth_date, gender, blood_type, phone,
                  emergency_contact_name, emergency_contact_relation,
                  emergency_contact_phone, relationship, photo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (user_id) DO UPDATE SET
                 birth_date = EXCLUDED.birth_date,
                 gender = EXCLUDED.gender,
                 blood_type = EXCLUDED.blood_type,
                 phone = EXCLUDED.phone,
                 emergency_contact_name = EXCLUDED.emergency_contact_name,
                 emergency_contact_relation = EXCLUDED.emergency_contact_relation,
                 emergency_contact_phone = EXCLUDED.emergency_contact_phone,
                 relationship = EXCLUDED.relationship,
                 photo_url = EXCLUDED.photo_url,
                 updated_at = now()
             RETURNING *",
        )
        .bind(user_id)
        .bind(data.birth_date)
        .bind(&data.gender)
        .bind(&data.blood_type)
        .bind(&data.phone)
        .bind(&data.emergency_contact_name)
        .bind(&data.emergency_contact_relation)
        .bind(&data.emergency_contact_phone)
        .bind(&data.relationship)
        .bind(&data.photo_url)
        .fetch_one(pool)
        .await?;
        Ok(profile)
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Single-use invite code a patient hands to a caregiver
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub code: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }

    pub async fn create(
        pool: &PgPool,
        patient_profile_id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteCode, DatabaseError> {
        let invite = sqlx::query_as::<_, InviteCode>(
            "INSERT INTO invite_codes (patient_profile_id, code, expires_at)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(patient_profile_id)
        .bind(code)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;
        Ok(invite)
    }

    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<InviteCode>, DatabaseError> {
        let invite = sqlx::query_as::<_, InviteCode>("SELECT * FROM invite_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await?;
        Ok(invite)
    }

    /// Marked used in the same transaction that creates the permission grant
    pub async fn mark_used(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE invite_codes SET used = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(used: bool, expires_in: Duration) -> InviteCode {
        let now = Utc::now();
        InviteCode {
            id: Uuid::new_v4(),
            patient_profile_id: Uuid::new_v4(),
            code: "ABCD2345".to_string(),
            used,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[test]
    fn fresh_code_is_redeemable() {
        assert!(invite(false, Duration::hours(24)).is_redeemable(Utc::now()));
    }

    #[test]
    fn used_or_expired_codes_are_not() {
        assert!(!invite(true, Duration::hours(24)).is_redeemable(Utc::now()));
        assert!(!invite(false, Duration::hours(-1)).is_redeemable(Utc::now()));
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Web-push subscription endpoint registered by a client device.
/// Stored only; delivery is out of scope for this service.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PushSubscription {
    /// Endpoint is the natural key: re-registering updates keys and owner
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
    ) -> Result<PushSubscription, DatabaseError> {
        let sub = sqlx::query_as::<_, PushSubscription>(
            "INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (endpoint) DO UPDATE SET
                 user_id = EXCLUDED.user_id,
                 p256dh = EXCLUDED.p256dh,
                 auth = EXCLUDED.auth,
                 updated_at = now()
             RETURNING *",
        )
        .bind(user_id)
        .bind(endpoint)
        .bind(p256dh)
        .bind(auth)
        .fetch_one(pool)
        .await?;
        Ok(sub)
    }

    /// Best-effort delete; removing an unknown endpoint is not an error
    pub async fn delete_by_endpoint(pool: &PgPool, endpoint: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(pool)
            .await?;
        Ok(())
    }
}

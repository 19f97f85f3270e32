use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::access::Role;
use crate::database::manager::DatabaseError;

/// Account row. Credentials never leave the store layer.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing)]
    pub password_salt: Vec<u8>,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Insert a new account inside an open transaction (registration also
    /// creates the patient profile, so both live in one transaction).
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
        password_hash: &[u8],
        password_salt: &[u8],
        role: Role,
    ) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, password_salt, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(email)
        .bind(password_hash)
        .bind(password_salt)
        .bind(role)
        .fetch_one(&mut **tx)
        .await?;
        Ok(user)
    }

    pub async fn update_name(
        pool: &PgPool,
        id: Uuid,
        name: Option<&str>,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET name = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
        Ok(())
    }
}

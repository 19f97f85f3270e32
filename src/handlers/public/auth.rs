use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use crate::access::Role;
use crate::auth::{self, password, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::models::patient::PatientProfile;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

const MIN_PASSWORD_LENGTH: usize = 6;

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    let mut field_errors = HashMap::new();
    if !email.contains('@') || email.len() < 3 {
        field_errors.insert("email".to_string(), "Must be a valid email address".to_string());
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        field_errors.insert(
            "password".to_string(),
            format!("Must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }
    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Invalid credentials payload", Some(field_errors)))
    }
}

/// POST /auth/register - Create an account and return a JWT.
/// Patient accounts get an empty patient profile in the same transaction.
pub async fn register(Json(body): Json<RegisterRequest>) -> ApiResult<serde_json::Value> {
    validate_credentials(&body.email, &body.password)?;

    let pool = DatabaseManager::pool().await?;

    if User::find_by_email(&pool, &body.email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    // Key stretching is CPU-heavy; keep it off the async workers
    let password = body.password.clone();
    let (hash, salt) = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Hashing task failed: {}", e)))?;

    let mut tx = pool.begin().await.map_err(crate::database::manager::DatabaseError::from)?;
    let user = User::create(&mut tx, &body.email, &hash, &salt, body.role).await?;
    if user.role == Role::Patient {
        PatientProfile::create_empty(&mut tx, user.id).await?;
    }
    tx.commit().await.map_err(crate::database::manager::DatabaseError::from)?;

    tracing::info!(user_id = %user.id, role = ?user.role, "Registered new user");

    let token = auth::generate_jwt(Claims::new(user.id, user.role))?;
    Ok(ApiResponse::created(json!({ "token": token })))
}

/// POST /auth/login - Verify credentials and return a JWT
pub async fn login(Json(body): Json<LoginRequest>) -> ApiResult<TokenResponse> {
    let pool = DatabaseManager::pool().await?;

    // Same response for unknown email and wrong password
    let user = User::find_by_email(&pool, &body.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let password = body.password.clone();
    let salt = user.password_salt.clone();
    let expected = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || {
        password::verify_password(&password, &salt, &expected)
    })
    .await
    .map_err(|e| ApiError::internal_server_error(format!("Hashing task failed: {}", e)))?;

    if !ok {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = auth::generate_jwt(Claims::new(user.id, user.role))?;
    Ok(ApiResponse::success(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_password() {
        let err = validate_credentials("a@b.com", "short").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn rejects_invalid_email() {
        assert!(validate_credentials("not-an-email", "long-enough").is_err());
    }

    #[test]
    fn accepts_valid_credentials() {
        assert!(validate_credentials("a@b.com", "long-enough").is_ok());
    }
}

use axum::extract::Extension;
use serde::Serialize;
use uuid::Uuid;

use crate::access::Role;
use crate::database::manager::DatabaseManager;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self { id: user.id, email: user.email, name: user.name, role: user.role }
    }
}

/// GET /api/auth/me - Current authenticated user
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> ApiResult<UserInfo> {
    let pool = DatabaseManager::pool().await?;

    let user = User::find_by_id(&pool, auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account no longer exists"))?;

    Ok(ApiResponse::success(user.into()))
}

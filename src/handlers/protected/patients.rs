use axum::{extract::Extension, response::Json};

use crate::access::Role;
use crate::database::manager::DatabaseManager;
use crate::database::models::patient::{PatientProfile, PatientProfileData};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

fn require_patient(auth_user: &AuthUser) -> Result<(), ApiError> {
    if auth_user.role == Role::Patient {
        Ok(())
    } else {
        Err(ApiError::forbidden("Patients only"))
    }
}

/// GET /api/patients/me - Own patient profile
pub async fn get_me(Extension(auth_user): Extension<AuthUser>) -> ApiResult<PatientProfile> {
    require_patient(&auth_user)?;
    let pool = DatabaseManager::pool().await?;

    let profile = PatientProfile::find_by_user(&pool, auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("No patient profile"))?;

    Ok(ApiResponse::success(profile))
}

/// PUT /api/patients/me - Upsert own patient profile
pub async fn put_me(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PatientProfileData>,
) -> ApiResult<PatientProfile> {
    require_patient(&auth_user)?;
    let pool = DatabaseManager::pool().await?;

    let profile = PatientProfile::upsert_for_user(&pool, auth_user.id, &body).await?;
    Ok(ApiResponse::success(profile))
}

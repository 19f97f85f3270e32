use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{AccessLevel, PermissionStatus};
use crate::database::manager::DatabaseManager;
use crate::database::models::patient::PatientProfile;
use crate::database::models::permission::{Permission, PermissionWithCaregiver};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/permissions/by-patient/:patient_profile_id - Owning patient
/// lists caregiver grants on their profile
pub async fn by_patient(
    Path(patient_profile_id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<PermissionWithCaregiver>> {
    let pool = DatabaseManager::pool().await?;

    // Only the profile owner sees its grants; caregiver access does not apply here
    let owner = PatientProfile::owner_of(&pool, patient_profile_id).await?;
    if owner != Some(auth_user.id) {
        return Err(ApiError::forbidden("NO_ACCESS"));
    }

    let grants = Permission::list_for_patient(&pool, patient_profile_id).await?;
    Ok(ApiResponse::success(grants))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPatch {
    pub status: Option<PermissionStatus>,
    pub level: Option<AccessLevel>,
}

/// PATCH /api/permissions/:id - Owning patient accepts/rejects a grant or
/// changes its level. Grants never transition on their own.
pub async fn patch(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PermissionPatch>,
) -> ApiResult<Permission> {
    let pool = DatabaseManager::pool().await?;

    let permission = Permission::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::forbidden("NO_ACCESS"))?;

    let owner = PatientProfile::owner_of(&pool, permission.patient_profile_id).await?;
    if owner != Some(auth_user.id) {
        return Err(ApiError::forbidden("NO_ACCESS"));
    }

    let updated = Permission::update(&pool, id, body.status, body.level).await?;

    tracing::info!(
        permission_id = %updated.id,
        status = ?updated.status,
        level = ?updated.level,
        "Permission updated by owning patient"
    );

    Ok(ApiResponse::success(updated))
}

use axum::{extract::Extension, response::Json};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::caregiver::{CaregiverProfile, CaregiverProfileData};
use crate::database::models::invite::InviteCode;
use crate::database::models::patient::PatientProfile;
use crate::database::models::permission::Permission;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

const INVITE_CODE_LENGTH: usize = 8;
const INVITE_TTL_HOURS: i64 = 24;

// No 0/O/1/I to keep codes readable over the phone
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn generate_invite_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length).map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char).collect()
}

fn require_caregiver(auth_user: &AuthUser) -> Result<(), ApiError> {
    if auth_user.role == Role::Caregiver {
        Ok(())
    } else {
        Err(ApiError::forbidden("Caregivers only"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/caregivers/invite - Patient generates a single-use invite code
pub async fn invite(Extension(auth_user): Extension<AuthUser>) -> ApiResult<InviteResponse> {
    if auth_user.role != Role::Patient {
        return Err(ApiError::forbidden("Patients only"));
    }
    let pool = DatabaseManager::pool().await?;

    let profile = PatientProfile::find_by_user(&pool, auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("No patient profile"))?;

    let code = generate_invite_code(INVITE_CODE_LENGTH);
    let expires_at = Utc::now() + Duration::hours(INVITE_TTL_HOURS);
    let invite = InviteCode::create(&pool, profile.id, &code, expires_at).await?;

    Ok(ApiResponse::success(InviteResponse { code: invite.code, expires_at: invite.expires_at }))
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
}

/// POST /api/caregivers/join - Caregiver redeems an invite code.
/// Creates (or resets to PENDING) the permission row for the pair and
/// burns the code, both in one transaction.
pub async fn join(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<JoinRequest>,
) -> ApiResult<serde_json::Value> {
    require_caregiver(&auth_user)?;
    if body.code.len() < 6 {
        return Err(ApiError::bad_request("INVALID_CODE"));
    }
    let pool = DatabaseManager::pool().await?;

    let invite = InviteCode::find_by_code(&pool, &body.code)
        .await?
        .filter(|invite| invite.is_redeemable(Utc::now()))
        .ok_or_else(|| ApiError::bad_request("INVALID_CODE"))?;

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;
    Permission::upsert_pending(&mut tx, invite.patient_profile_id, auth_user.id).await?;
    InviteCode::mark_used(&mut tx, invite.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    tracing::info!(
        caregiver_id = %auth_user.id,
        patient_profile_id = %invite.patient_profile_id,
        "Caregiver requested access via invite code"
    );

    Ok(ApiResponse::success(serde_json::json!({ "ok": true })))
}

/// GET /api/caregivers/patients - Profiles this caregiver has an ACCEPTED grant on
pub async fn patients(Extension(auth_user): Extension<AuthUser>) -> ApiResult<Vec<PatientProfile>> {
    require_caregiver(&auth_user)?;
    let pool = DatabaseManager::pool().await?;

    let profiles = Permission::accepted_profiles_for_caregiver(&pool, auth_user.id).await?;
    Ok(ApiResponse::success(profiles))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaregiverMeResponse {
    #[serde(flatten)]
    pub profile: CaregiverProfile,
    pub name: Option<String>,
}

/// GET /api/caregivers/me - Own caregiver profile, with display name from the account
pub async fn get_me(Extension(auth_user): Extension<AuthUser>) -> ApiResult<CaregiverMeResponse> {
    require_caregiver(&auth_user)?;
    let pool = DatabaseManager::pool().await?;

    let profile = CaregiverProfile::find_by_user(&pool, auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("No caregiver profile"))?;
    let user = User::find_by_id(&pool, auth_user.id).await?;

    Ok(ApiResponse::success(CaregiverMeResponse {
        profile,
        name: user.and_then(|u| u.name),
    }))
}

/// PUT /api/caregivers/me - Upsert own caregiver profile; a provided name
/// also updates the account's display name
pub async fn put_me(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CaregiverProfileData>,
) -> ApiResult<CaregiverMeResponse> {
    require_caregiver(&auth_user)?;
    let pool = DatabaseManager::pool().await?;

    if let Some(name) = &body.name {
        User::update_name(&pool, auth_user.id, Some(name)).await?;
    }

    let profile = CaregiverProfile::upsert_for_user(&pool, auth_user.id, &body).await?;
    let user = User::find_by_id(&pool, auth_user.id).await?;

    Ok(ApiResponse::success(CaregiverMeResponse {
        profile,
        name: user.and_then(|u| u.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_codes_use_the_unambiguous_alphabet() {
        let code = generate_invite_code(INVITE_CODE_LENGTH);
        assert_eq!(code.len(), INVITE_CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        for ambiguous in ['0', 'O', '1', 'I'] {
            assert!(!code.contains(ambiguous));
        }
    }
}

use axum::{
    extract::{Extension, Query},
    response::Json,
};
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::database::models::push_subscription::PushSubscription;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

// Push services only hand out https endpoints
fn validate_endpoint(endpoint: &str) -> Result<(), ApiError> {
    if !endpoint.starts_with("https://") {
        return Err(ApiError::bad_request("Endpoint must be an https URL"));
    }
    Ok(())
}

/// POST /api/subscribe - Register or refresh a push subscription for this user
pub async fn subscribe(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<SubscribeRequest>,
) -> ApiResult<PushSubscription> {
    validate_endpoint(&body.endpoint)?;

    let pool = DatabaseManager::pool().await?;
    let sub =
        PushSubscription::upsert(&pool, auth_user.id, &body.endpoint, &body.p256dh, &body.auth)
            .await?;

    Ok(ApiResponse::success(sub))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub endpoint: String,
}

/// DELETE /api/subscribe?endpoint= - Drop a subscription; unknown endpoints
/// are silently ignored
pub async fn unsubscribe(
    Extension(_auth_user): Extension<AuthUser>,
    Query(query): Query<UnsubscribeQuery>,
) -> ApiResult<()> {
    validate_endpoint(&query.endpoint)?;

    let pool = DatabaseManager::pool().await?;
    PushSubscription::delete_by_endpoint(&pool, &query.endpoint).await?;
    Ok(ApiResponse::<()>::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_endpoints_pass() {
        assert!(validate_endpoint("https://push.example.com/send/abc").is_ok());
    }

    #[test]
    fn plain_http_and_garbage_endpoints_are_rejected() {
        for bad in ["http://push.example.com/send/abc", "not a url", ""] {
            let err = validate_endpoint(bad).unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
    }
}

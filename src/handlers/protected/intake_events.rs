use axum::{
    extract::{Extension, Query},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::access::{self, AccessLevel};
use crate::api::pagination::{PageQuery, Pagination};
use crate::api::ListResponse;
use crate::database::manager::DatabaseManager;
use crate::database::models::intake_event::{
    IntakeAction, IntakeEvent, IntakeEventFilters, IntakeKind, NewIntakeEvent,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIntakeEventsQuery {
    pub patient_profile_id: Uuid,
    pub kind: Option<IntakeKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    // serde_urlencoded cannot flatten PageQuery, so the fields are inlined
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/intake-events - Adherence history, most recent first
pub async fn list(
    Query(query): Query<ListIntakeEventsQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ListResponse<IntakeEvent>> {
    let pool = DatabaseManager::pool().await?;
    access::require(&pool, query.patient_profile_id, &auth_user, AccessLevel::Read).await?;

    let pagination =
        Pagination::from_query(&PageQuery { page: query.page, page_size: query.page_size });
    let filters = IntakeEventFilters {
        patient_profile_id: query.patient_profile_id,
        kind: query.kind,
        from: query.from,
        to: query.to,
    };
    let (total, items) = IntakeEvent::list(&pool, &filters, &pagination).await?;

    Ok(ApiResponse::success(ListResponse::new(items, total, pagination)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntakeEventRequest {
    pub patient_profile_id: Uuid,
    pub kind: IntakeKind,
    pub ref_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub action: IntakeAction,
    pub at: Option<DateTime<Utc>>,
    pub meta: Option<Value>,
}

/// POST /api/intake-events - Record a taken/snoozed/skipped dose
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateIntakeEventRequest>,
) -> ApiResult<IntakeEvent> {
    let pool = DatabaseManager::pool().await?;
    access::require(&pool, body.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let new = NewIntakeEvent {
        patient_profile_id: body.patient_profile_id,
        kind: body.kind,
        ref_id: body.ref_id,
        scheduled_for: body.scheduled_for,
        action: body.action,
        at: body.at,
        meta: body.meta,
    };
    let event = IntakeEvent::create(&pool, &new).await?;

    Ok(ApiResponse::created(event))
}

use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{self, AccessLevel};
use crate::api::pagination::{PageQuery, Pagination};
use crate::api::{ListResponse, SortOrder};
use crate::database::manager::DatabaseManager;
use crate::database::models::appointment::{
    Appointment, AppointmentChanges, AppointmentFilters, AppointmentSort, AppointmentStatus,
    NewAppointment,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsQuery {
    pub patient_profile_id: Uuid,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort: AppointmentSort,
    pub order: Option<SortOrder>,
    // serde_urlencoded cannot flatten PageQuery, so the fields are inlined
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/appointments - Paginated appointments for one patient,
/// soonest first by default
pub async fn list(
    Query(query): Query<ListAppointmentsQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ListResponse<Appointment>> {
    let pool = DatabaseManager::pool().await?;
    access::require(&pool, query.patient_profile_id, &auth_user, AccessLevel::Read).await?;

    let pagination =
        Pagination::from_query(&PageQuery { page: query.page, page_size: query.page_size });
    let filters = AppointmentFilters {
        patient_profile_id: query.patient_profile_id,
        status: query.status,
        from: query.from,
        to: query.to,
    };
    let order = query.order.unwrap_or(SortOrder::Asc);
    let (total, items) = Appointment::list(&pool, &filters, query.sort, order, &pagination).await?;

    Ok(ApiResponse::success(ListResponse::new(items, total, pagination)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub status: Option<AppointmentStatus>,
}

/// POST /api/appointments
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateAppointmentRequest>,
) -> ApiResult<Appointment> {
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("Appointment title is required"));
    }

    let pool = DatabaseManager::pool().await?;
    access::require(&pool, body.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let new = NewAppointment {
        patient_profile_id: body.patient_profile_id,
        title: body.title,
        description: body.description,
        date_time: body.date_time,
        location: body.location,
        status: body.status.unwrap_or(AppointmentStatus::Scheduled),
    };
    let created = Appointment::create(&pool, &new).await?;

    Ok(ApiResponse::created(created))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchAppointmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: Option<AppointmentStatus>,
}

/// PATCH /api/appointments/:id
pub async fn patch(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PatchAppointmentRequest>,
) -> ApiResult<Appointment> {
    let pool = DatabaseManager::pool().await?;

    let appointment = Appointment::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    access::require(&pool, appointment.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let changes = AppointmentChanges {
        title: body.title,
        description: body.description,
        date_time: body.date_time,
        location: body.location,
        status: body.status,
    };
    let updated = Appointment::update(&pool, &appointment, &changes).await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/appointments/:id
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;

    let appointment = Appointment::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    access::require(&pool, appointment.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    Appointment::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

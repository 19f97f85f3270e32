use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{self, AccessLevel};
use crate::api::pagination::{PageQuery, Pagination};
use crate::api::{
    double_option, validate_days_of_week, validate_times, ListResponse, SortOrder,
};
use crate::database::manager::DatabaseManager;
use crate::database::models::medication::{
    Medication, MedicationChanges, MedicationFilters, MedicationSort, NewMedication, NewSchedule,
    ScheduleChanges,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMedicationsQuery {
    pub patient_profile_id: Uuid,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort: MedicationSort,
    pub order: Option<SortOrder>,
    // serde_urlencoded cannot flatten PageQuery, so the fields are inlined
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/medications - Paginated medication list for one patient
pub async fn list(
    Query(query): Query<ListMedicationsQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ListResponse<Medication>> {
    let pool = DatabaseManager::pool().await?;
    access::require(&pool, query.patient_profile_id, &auth_user, AccessLevel::Read).await?;

    let pagination =
        Pagination::from_query(&PageQuery { page: query.page, page_size: query.page_size });
    let filters = MedicationFilters {
        patient_profile_id: query.patient_profile_id,
        search: query.search,
        from: query.from,
        to: query.to,
    };
    let order = query.order.unwrap_or(SortOrder::Desc);
    let (total, items) = Medication::list(&pool, &filters, query.sort, order, &pagination).await?;

    Ok(ApiResponse::success(ListResponse::new(items, total, pagination)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicationRequest {
    pub patient_profile_id: Uuid,
    pub name: String,
    pub dosage: Option<String>,
    #[serde(rename = "type")]
    pub med_type: Option<String>,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub schedule: Option<NewSchedule>,
}

/// POST /api/medications - Create a medication, optionally with its dosing schedule
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMedicationRequest>,
) -> ApiResult<Medication> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Medication name is required"));
    }
    if body.frequency.trim().is_empty() {
        return Err(ApiError::bad_request("Frequency is required"));
    }
    if let Some(schedule) = &body.schedule {
        validate_times(&schedule.times)?;
        validate_days_of_week(&schedule.days_of_week)?;
    }

    let pool = DatabaseManager::pool().await?;
    access::require(&pool, body.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let new = NewMedication {
        patient_profile_id: body.patient_profile_id,
        name: body.name,
        dosage: body.dosage,
        med_type: body.med_type,
        frequency: body.frequency,
        start_date: body.start_date,
        end_date: body.end_date,
        notes: body.notes,
        schedule: body.schedule,
    };
    let created = Medication::create(&pool, &new).await?;

    Ok(ApiResponse::created(created))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchMedicationRequest {
    pub name: Option<String>,
    pub dosage: Option<String>,
    #[serde(rename = "type")]
    pub med_type: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    /// Absent = keep, null = clear
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
    pub schedule: Option<ScheduleChanges>,
}

/// PATCH /api/medications/:id - Partial update; authorization is checked
/// against the profile the stored row belongs to
pub async fn patch(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PatchMedicationRequest>,
) -> ApiResult<Medication> {
    if let Some(schedule) = &body.schedule {
        if let Some(times) = &schedule.times {
            validate_times(times)?;
        }
        validate_days_of_week(&schedule.days_of_week)?;
    }

    let pool = DatabaseManager::pool().await?;

    let medication = Medication::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medication not found"))?;
    access::require(&pool, medication.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let changes = MedicationChanges {
        name: body.name,
        dosage: body.dosage,
        med_type: body.med_type,
        frequency: body.frequency,
        start_date: body.start_date,
        end_date: body.end_date,
        notes: body.notes,
        schedule: body.schedule,
    };
    let updated = Medication::update(&pool, &medication, &changes).await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/medications/:id - Remove a medication and its schedule
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;

    let medication = Medication::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Medication not found"))?;
    access::require(&pool, medication.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    Medication::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}


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
use crate::database::models::treatment::{
    NewReminder, NewTreatment, Treatment, TreatmentChanges, TreatmentFilters, TreatmentSort,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// Reminder dose times and days get the same checks as medication schedules
fn validate_reminders(reminders: &[NewReminder]) -> Result<(), ApiError> {
    for reminder in reminders {
        validate_times(&reminder.times)?;
        validate_days_of_week(&reminder.days_of_week)?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTreatmentsQuery {
    pub patient_profile_id: Uuid,
    pub active: Option<bool>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: TreatmentSort,
    pub order: Option<SortOrder>,
    // serde_urlencoded cannot flatten PageQuery, so the fields are inlined
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/treatments - Paginated treatment list for one patient
pub async fn list(
    Query(query): Query<ListTreatmentsQuery>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<ListResponse<Treatment>> {
    let pool = DatabaseManager::pool().await?;
    access::require(&pool, query.patient_profile_id, &auth_user, AccessLevel::Read).await?;

    let pagination =
        Pagination::from_query(&PageQuery { page: query.page, page_size: query.page_size });
    let filters = TreatmentFilters {
        patient_profile_id: query.patient_profile_id,
        active: query.active,
        search: query.search,
    };
    let order = query.order.unwrap_or(SortOrder::Desc);
    let (total, items) = Treatment::list(&pool, &filters, query.sort, order, &pagination).await?;

    Ok(ApiResponse::success(ListResponse::new(items, total, pagination)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreatmentRequest {
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub progress: Option<String>,
    #[serde(default)]
    pub reminders: Vec<NewReminder>,
}

/// POST /api/treatments - Create a treatment, optionally with reminders
pub async fn create(
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateTreatmentRequest>,
) -> ApiResult<Treatment> {
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("Treatment title is required"));
    }
    validate_reminders(&body.reminders)?;

    let pool = DatabaseManager::pool().await?;
    access::require(&pool, body.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let new = NewTreatment {
        patient_profile_id: body.patient_profile_id,
        title: body.title,
        description: body.description,
        start_date: body.start_date,
        end_date: body.end_date,
        progress: body.progress,
        reminders: body.reminders,
    };
    let created = Treatment::create(&pool, &new).await?;

    Ok(ApiResponse::created(created))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTreatmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    /// Absent = keep, null = mark active again
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub progress: Option<String>,
}

/// PATCH /api/treatments/:id
pub async fn patch(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<PatchTreatmentRequest>,
) -> ApiResult<Treatment> {
    let pool = DatabaseManager::pool().await?;

    let treatment = Treatment::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Treatment not found"))?;
    access::require(&pool, treatment.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    let changes = TreatmentChanges {
        title: body.title,
        description: body.description,
        start_date: body.start_date,
        end_date: body.end_date,
        progress: body.progress,
    };
    let updated = Treatment::update(&pool, &treatment, &changes).await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/treatments/:id - Remove a treatment and its reminders
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<()> {
    let pool = DatabaseManager::pool().await?;

    let treatment = Treatment::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Treatment not found"))?;
    access::require(&pool, treatment.patient_profile_id, &auth_user, AccessLevel::Write).await?;

    Treatment::delete(&pool, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder(times: Vec<&str>, days_of_week: Option<Vec<i32>>) -> NewReminder {
        NewReminder {
            frequency: "daily".to_string(),
            times: times.into_iter().map(String::from).collect(),
            days_of_week,
            timezone: "UTC".to_string(),
        }
    }

    #[test]
    fn well_formed_reminders_pass() {
        let reminders = [reminder(vec!["08:00", "20:30"], Some(vec![1, 3, 5]))];
        assert!(validate_reminders(&reminders).is_ok());
        assert!(validate_reminders(&[]).is_ok());
    }

    #[test]
    fn malformed_reminder_times_are_rejected() {
        let reminders = [reminder(vec!["ab:cd"], None)];
        let err = validate_reminders(&reminders).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn out_of_range_reminder_days_are_rejected() {
        let reminders = [reminder(vec!["08:00"], Some(vec![7]))];
        assert!(validate_reminders(&reminders).is_err());
    }

    #[test]
    fn one_bad_reminder_fails_the_batch() {
        let reminders =
            [reminder(vec!["08:00"], None), reminder(vec!["9:5"], Some(vec![0]))];
        assert!(validate_reminders(&reminders).is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::api::pagination::Pagination;
use crate::api::SortOrder;
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "appointment_status", rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilters {
    pub patient_profile_id: Uuid,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentSort {
    #[default]
    DateTime,
    CreatedAt,
}

impl AppointmentSort {
    fn column(self) -> &'static str {
        match self {
            AppointmentSort::DateTime => "date_time",
            AppointmentSort::CreatedAt => "created_at",
        }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a AppointmentFilters) {
    qb.push(" WHERE patient_profile_id = ").push_bind(filters.patient_profile_id);
    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filters.from {
        qb.push(" AND date_time >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND date_time <= ").push_bind(to);
    }
}

impl Appointment {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        let appointment =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(appointment)
    }

    pub async fn list(
        pool: &PgPool,
        filters: &AppointmentFilters,
        sort: AppointmentSort,
        order: SortOrder,
        pagination: &Pagination,
    ) -> Result<(i64, Vec<Appointment>), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM appointments");
        push_filters(&mut count_query, filters);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM appointments");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(order.as_sql())
            .push(" LIMIT ")
            .push_bind(pagination.take)
            .push(" OFFSET ")
            .push_bind(pagination.skip);
        let items = query.build_query_as::<Appointment>().fetch_all(pool).await?;

        Ok((total, items))
    }

    pub async fn create(pool: &PgPool, new: &NewAppointment) -> Result<Appointment, DatabaseError> {
        let appointment = sqlx::query_as::<_, Appointment>(
            "INSERT INTO appointments
                 (patient_profile_id, title, description, date_time, location, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(new.patient_profile_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.date_time)
        .bind(&new.location)
        .bind(new.status)
        .fetch_one(pool)
        .await?;
        Ok(appointment)
    }

    pub async fn update(
        pool: &PgPool,
        current: &Appointment,
        changes: &AppointmentChanges,
    ) -> Result<Appointment, DatabaseError> {
        let title = changes.title.as_ref().unwrap_or(&current.title);
        let description = changes.description.as_ref().or(current.description.as_ref());
        let date_time = changes.date_time.unwrap_or(current.date_time);
        let location = changes.location.as_ref().or(current.location.as_ref());
        let status = changes.status.unwrap_or(current.status);

        let appointment = sqlx::query_as::<_, Appointment>(
            "UPDATE appointments
             SET title = $2, description = $3, date_time = $4, location = $5,
                 status = $6, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(current.id)
        .bind(title)
        .bind(description)
        .bind(date_time)
        .bind(location)
        .bind(status)
        .fetch_one(pool)
        .await?;
        Ok(appointment)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM appointments WHERE id = $1").bind(id).execute(pool).await?;
        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::api::pagination::Pagination;
use crate::api::SortOrder;
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    /// A treatment is active while end_date is NULL
    pub end_date: Option<DateTime<Utc>>,
    pub progress: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentReminder {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub treatment_id: Uuid,
    pub frequency: String,
    pub times: Vec<String>,
    pub days_of_week: Option<Vec<i32>>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub frequency: String,
    pub times: Vec<String>,
    pub days_of_week: Option<Vec<i32>>,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub patient_profile_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub progress: Option<String>,
    pub reminders: Vec<NewReminder>,
}

#[derive(Debug, Clone, Default)]
pub struct TreatmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub progress: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TreatmentFilters {
    pub patient_profile_id: Uuid,
    /// Some(true) = only active (end_date NULL), Some(false) = only ended
    pub active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatmentSort {
    #[default]
    CreatedAt,
    Title,
}

impl TreatmentSort {
    fn column(self) -> &'static str {
        match self {
            TreatmentSort::CreatedAt => "created_at",
            TreatmentSort::Title => "title",
        }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a TreatmentFilters) {
    qb.push(" WHERE patient_profile_id = ").push_bind(filters.patient_profile_id);
    match filters.active {
        Some(true) => {
            qb.push(" AND end_date IS NULL");
        }
        Some(false) => {
            qb.push(" AND end_date IS NOT NULL");
        }
        None => {}
    }
    if let Some(search) = &filters.search {
        qb.push(" AND title ILIKE ").push_bind(format!("%{}%", search));
    }
}

impl Treatment {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Treatment>, DatabaseError> {
        let treatment = sqlx::query_as::<_, Treatment>("SELECT * FROM treatments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(treatment)
    }

    pub async fn list(
        pool: &PgPool,
        filters: &TreatmentFilters,
        sort: TreatmentSort,
        order: SortOrder,
        pagination: &Pagination,
    ) -> Result<(i64, Vec<Treatment>), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM treatments");
        push_filters(&mut count_query, filters);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM treatments");
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
        let items = query.build_query_as::<Treatment>().fetch_all(pool).await?;

        Ok((total, items))
    }

    /// Create a treatment and its reminders in one transaction
    pub async fn create(pool: &PgPool, new: &NewTreatment) -> Result<Treatment, DatabaseError> {
        let mut tx = pool.begin().await?;

        let treatment = sqlx::query_as::<_, Treatment>(
            "INSERT INTO treatments
                 (patient_profile_id, title, description, start_date, end_date, progress)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(new.patient_profile_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.progress)
        .fetch_one(&mut *tx)
        .await?;

        for reminder in &new.reminders {
            sqlx::query(
                "INSERT INTO treatment_reminders
                     (patient_profile_id, treatment_id, frequency, times, days_of_week, timezone)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(new.patient_profile_id)
            .bind(treatment.id)
            .bind(&reminder.frequency)
            .bind(&reminder.times)
            .bind(&reminder.days_of_week)
            .bind(&reminder.timezone)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(treatment)
    }

    pub async fn update(
        pool: &PgPool,
        current: &Treatment,
        changes: &TreatmentChanges,
    ) -> Result<Treatment, DatabaseError> {
        let title = changes.title.as_ref().unwrap_or(&current.title);
        let description = changes.description.as_ref().or(current.description.as_ref());
        let start_date = changes.start_date.unwrap_or(current.start_date);
        let end_date = match changes.end_date {
            Some(explicit) => explicit,
            None => current.end_date,
        };
        let progress = changes.progress.as_ref().or(current.progress.as_ref());

        let treatment = sqlx::query_as::<_, Treatment>(
            "UPDATE treatments
             SET title = $2, description = $3, start_date = $4, end_date = $5,
                 progress = $6, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(current.id)
        .bind(title)
        .bind(description)
        .bind(start_date)
        .bind(end_date)
        .bind(progress)
        .fetch_one(pool)
        .await?;
        Ok(treatment)
    }

    /// Delete a treatment and its reminders in one transaction
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM treatment_reminders WHERE treatment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM treatments WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

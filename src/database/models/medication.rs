use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::api::pagination::Pagination;
use crate::api::SortOrder;
use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub name: String,
    pub dosage: Option<String>,
    #[serde(rename = "type")]
    pub med_type: Option<String>,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSchedule {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub medication_id: Uuid,
    pub frequency: String,
    /// Wall-clock dose times as HH:MM strings
    pub times: Vec<String>,
    /// 0 = Sunday .. 6 = Saturday; None means every day
    pub days_of_week: Option<Vec<i32>>,
    pub custom_rule: Option<Value>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchedule {
    pub frequency: String,
    pub times: Vec<String>,
    pub days_of_week: Option<Vec<i32>>,
    pub custom_rule: Option<Value>,
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleChanges {
    pub frequency: Option<String>,
    pub times: Option<Vec<String>>,
    pub days_of_week: Option<Vec<i32>>,
    pub custom_rule: Option<Value>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedication {
    pub patient_profile_id: Uuid,
    pub name: String,
    pub dosage: Option<String>,
    pub med_type: Option<String>,
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub schedule: Option<NewSchedule>,
}

/// Partial update; `end_date` distinguishes "leave alone" (outer None) from
/// "clear" (Some(None))
#[derive(Debug, Clone, Default)]
pub struct MedicationChanges {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub med_type: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
    pub schedule: Option<ScheduleChanges>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicationFilters {
    pub patient_profile_id: Uuid,
    /// Case-insensitive substring match on name or notes
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MedicationSort {
    #[default]
    CreatedAt,
    StartDate,
    Name,
}

impl MedicationSort {
    fn column(self) -> &'static str {
        match self {
            MedicationSort::CreatedAt => "created_at",
            MedicationSort::StartDate => "start_date",
            MedicationSort::Name => "name",
        }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a MedicationFilters) {
    qb.push(" WHERE patient_profile_id = ").push_bind(filters.patient_profile_id);
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR notes ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filters.from {
        qb.push(" AND start_date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND start_date <= ").push_bind(to);
    }
}

impl Medication {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Medication>, DatabaseError> {
        let med = sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(med)
    }

    /// Filtered, sorted page of medications plus the unpaginated total
    pub async fn list(
        pool: &PgPool,
        filters: &MedicationFilters,
        sort: MedicationSort,
        order: SortOrder,
        pagination: &Pagination,
    ) -> Result<(i64, Vec<Medication>), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM medications");
        push_filters(&mut count_query, filters);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM medications");
        push_filters(&mut query, filters);
        // Sort column comes from a closed enum, never from raw input
        query
            .push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(order.as_sql())
            .push(" LIMIT ")
            .push_bind(pagination.take)
            .push(" OFFSET ")
            .push_bind(pagination.skip);
        let items = query.build_query_as::<Medication>().fetch_all(pool).await?;

        Ok((total, items))
    }

    /// Create a medication and its optional schedule in one transaction
    pub async fn create(pool: &PgPool, new: &NewMedication) -> Result<Medication, DatabaseError> {
        let mut tx = pool.begin().await?;

        let med = sqlx::query_as::<_, Medication>(
            "INSERT INTO medications
                 (patient_profile_id, name, dosage, med_type, frequency,
                  start_date, end_date, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(new.patient_profile_id)
        .bind(&new.name)
        .bind(&new.dosage)
        .bind(&new.med_type)
        .bind(&new.frequency)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(schedule) = &new.schedule {
            sqlx::query(
                "INSERT INTO medication_schedules
                     (patient_profile_id, medication_id, frequency, times,
                      days_of_week, custom_rule, timezone)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(new.patient_profile_id)
            .bind(med.id)
            .bind(&schedule.frequency)
            .bind(&schedule.times)
            .bind(&schedule.days_of_week)
            .bind(&schedule.custom_rule)
            .bind(&schedule.timezone)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(med)
    }

    /// Apply a partial update to an already-fetched row, upserting the
    /// schedule when schedule changes are present
    pub async fn update(
        pool: &PgPool,
        current: &Medication,
        changes: &MedicationChanges,
    ) -> Result<Medication, DatabaseError> {
        let name = changes.name.as_ref().unwrap_or(&current.name);
        let dosage = changes.dosage.as_ref().or(current.dosage.as_ref());
        let med_type = changes.med_type.as_ref().or(current.med_type.as_ref());
        let frequency = changes.frequency.as_ref().unwrap_or(&current.frequency);
        let start_date = changes.start_date.unwrap_or(current.start_date);
        let end_date = match changes.end_date {
            Some(explicit) => explicit,
            None => current.end_date,
        };
        let notes = changes.notes.as_ref().or(current.notes.as_ref());

        let mut tx = pool.begin().await?;

        let med = sqlx::query_as::<_, Medication>(
            "UPDATE medications
             SET name = $2, dosage = $3, med_type = $4, frequency = $5,
                 start_date = $6, end_date = $7, notes = $8, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(current.id)
        .bind(name)
        .bind(dosage)
        .bind(med_type)
        .bind(frequency)
        .bind(start_date)
        .bind(end_date)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(schedule) = &changes.schedule {
            let existing = sqlx::query_as::<_, MedicationSchedule>(
                "SELECT * FROM medication_schedules WHERE medication_id = $1",
            )
            .bind(current.id)
            .fetch_optional(&mut *tx)
            .await?;

            match existing {
                Some(row) => {
                    sqlx::query(
                        "UPDATE medication_schedules
                         SET frequency = $2, times = $3, days_of_week = $4,
                             custom_rule = $5, timezone = $6, updated_at = now()
                         WHERE id = $1",
                    )
                    .bind(row.id)
                    .bind(schedule.frequency.as_ref().unwrap_or(&row.frequency))
                    .bind(schedule.times.as_ref().unwrap_or(&row.times))
                    .bind(schedule.days_of_week.as_ref().or(row.days_of_week.as_ref()))
                    .bind(schedule.custom_rule.as_ref().or(row.custom_rule.as_ref()))
                    .bind(schedule.timezone.as_ref().unwrap_or(&row.timezone))
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO medication_schedules
                             (patient_profile_id, medication_id, frequency, times,
                              days_of_week, custom_rule, timezone)
                         VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    )
                    .bind(current.patient_profile_id)
                    .bind(current.id)
                    .bind(schedule.frequency.as_deref().unwrap_or("daily"))
                    .bind(schedule.times.clone().unwrap_or_default())
                    .bind(&schedule.days_of_week)
                    .bind(&schedule.custom_rule)
                    .bind(schedule.timezone.as_deref().unwrap_or("UTC"))
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(med)
    }

    /// Delete a medication and its schedule rows in one transaction
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM medication_schedules WHERE medication_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM medications WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

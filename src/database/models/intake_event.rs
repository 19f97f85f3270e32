use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::api::pagination::Pagination;
use crate::database::manager::DatabaseError;

/// What a dose event refers to: a medication or a treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "intake_kind", rename_all = "UPPERCASE")]
pub enum IntakeKind {
    Med,
    Trt,
}

/// What the patient did with a scheduled dose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "intake_action", rename_all = "UPPERCASE")]
pub enum IntakeAction {
    Taken,
    Snooze,
    Skipped,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IntakeEvent {
    pub id: Uuid,
    pub patient_profile_id: Uuid,
    pub kind: IntakeKind,
    /// Medication or treatment id the event refers to
    pub ref_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub action: IntakeAction,
    pub at: DateTime<Utc>,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIntakeEvent {
    pub patient_profile_id: Uuid,
    pub kind: IntakeKind,
    pub ref_id: Uuid,
    pub scheduled_for: DateTime<Utc>,
    pub action: IntakeAction,
    /// Defaults to now() when unset
    pub at: Option<DateTime<Utc>>,
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct IntakeEventFilters {
    pub patient_profile_id: Uuid,
    pub kind: Option<IntakeKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a IntakeEventFilters) {
    qb.push(" WHERE patient_profile_id = ").push_bind(filters.patient_profile_id);
    if let Some(kind) = filters.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(from) = filters.from {
        qb.push(" AND at >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND at <= ").push_bind(to);
    }
}

impl IntakeEvent {
    /// Most recent events first
    pub async fn list(
        pool: &PgPool,
        filters: &IntakeEventFilters,
        pagination: &Pagination,
    ) -> Result<(i64, Vec<IntakeEvent>), DatabaseError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM intake_events");
        push_filters(&mut count_query, filters);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(pool).await?;

        let mut query = QueryBuilder::new("SELECT * FROM intake_events");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY at DESC LIMIT ")
            .push_bind(pagination.take)
            .push(" OFFSET ")
            .push_bind(pagination.skip);
        let items = query.build_query_as::<IntakeEvent>().fetch_all(pool).await?;

        Ok((total, items))
    }

    pub async fn create(pool: &PgPool, new: &NewIntakeEvent) -> Result<IntakeEvent, DatabaseError> {
        let event = sqlx::query_as::<_, IntakeEvent>(
            "INSERT INTO intake_events
                 (patient_profile_id, kind, ref_id, scheduled_for, action, at, meta)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()), $7)
             RETURNING *",
        )
        .bind(new.patient_profile_id)
        .bind(new.kind)
        .bind(new.ref_id)
        .bind(new.scheduled_for)
        .bind(new.action)
        .bind(new.at)
        .bind(&new.meta)
        .fetch_one(pool)
        .await?;
        Ok(event)
    }
}

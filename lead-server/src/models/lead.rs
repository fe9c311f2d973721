//! Lead model

use chrono::{DateTime, Utc};
use leadscore_core::{LeadInsight, RawLeadRecord, ScoredRow};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Stored lead. Serializes flat: the raw lead columns next to the
/// prediction fields the dashboard reads (`prediction_score`,
/// `prediction_label`, `shap_explanation`).
#[derive(Debug, Clone, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub attributes: serde_json::Value,
    pub score: f64,
    pub label: String,
    pub explanation: Option<serde_json::Value>,
    pub recommendation: String,
    pub source: String,
    pub is_contacted: bool,
    pub status_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const LEAD_FIELDS: [&str; 10] = [
    "id",
    "prediction_score",
    "prediction_label",
    "shap_explanation",
    "recommendation",
    "source",
    "is_contacted",
    "status_notes",
    "created_at",
    "updated_at",
];

impl Serialize for Lead {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let columns = self.attributes.as_object();
        let mut map = serializer.serialize_map(None)?;

        // lead fields win over a raw column of the same name
        for (key, value) in columns.into_iter().flatten() {
            if !LEAD_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }

        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("prediction_score", &self.score)?;
        map.serialize_entry("prediction_label", &self.label)?;
        map.serialize_entry("shap_explanation", &self.explanation)?;
        map.serialize_entry("recommendation", &self.recommendation)?;
        map.serialize_entry("source", &self.source)?;
        map.serialize_entry("is_contacted", &self.is_contacted)?;
        map.serialize_entry("status_notes", &self.status_notes)?;
        map.serialize_entry("created_at", &self.created_at)?;
        map.serialize_entry("updated_at", &self.updated_at)?;
        map.end()
    }
}

/// Typed single-lead payload (bank-marketing columns, no call duration)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLead {
    #[validate(range(min = 17, max = 120))]
    pub age: i64,
    #[validate(length(min = 1, max = 50))]
    pub job: String,
    #[validate(length(min = 1, max = 50))]
    pub marital: String,
    #[validate(length(min = 1, max = 50))]
    pub education: String,
    #[validate(length(min = 1, max = 20))]
    pub default: String,
    #[validate(length(min = 1, max = 20))]
    pub housing: String,
    #[validate(length(min = 1, max = 20))]
    pub loan: String,
    #[validate(length(min = 1, max = 20))]
    pub contact: String,
    #[validate(length(min = 3, max = 3))]
    pub month: String,
    #[validate(length(min = 3, max = 3))]
    pub day_of_week: String,
    #[validate(range(min = 1))]
    pub campaign: i64,
    #[validate(range(min = 0))]
    pub pdays: i64,
    #[validate(range(min = 0))]
    pub previous: i64,
    #[validate(length(min = 1, max = 20))]
    pub poutcome: String,
    pub emp_var_rate: f64,
    pub cons_price_idx: f64,
    pub cons_conf_idx: f64,
    pub euribor3m: f64,
    pub nr_employed: f64,
}

impl CreateLead {
    pub fn to_record(&self) -> RawLeadRecord {
        RawLeadRecord::new()
            .with("age", self.age)
            .with("job", self.job.as_str())
            .with("marital", self.marital.as_str())
            .with("education", self.education.as_str())
            .with("default", self.default.as_str())
            .with("housing", self.housing.as_str())
            .with("loan", self.loan.as_str())
            .with("contact", self.contact.as_str())
            .with("month", self.month.as_str())
            .with("day_of_week", self.day_of_week.as_str())
            .with("campaign", self.campaign)
            .with("pdays", self.pdays)
            .with("previous", self.previous)
            .with("poutcome", self.poutcome.as_str())
            .with("emp_var_rate", self.emp_var_rate)
            .with("cons_price_idx", self.cons_price_idx)
            .with("cons_conf_idx", self.cons_conf_idx)
            .with("euribor3m", self.euribor3m)
            .with("nr_employed", self.nr_employed)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLeadStatus {
    pub is_contacted: bool,
    #[validate(length(max = 2000))]
    pub status_notes: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LeadFilter {
    pub label: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Large enough for the analytics page, which aggregates client-side
const MAX_LIST_LIMIT: i64 = 5000;

impl LeadFilter {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, MAX_LIST_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

const INSERT_LEAD: &str = r#"
    INSERT INTO leads (attributes, score, label, explanation, recommendation, source)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING *
"#;

impl Lead {
    pub async fn create(
        pool: &PgPool,
        record: &RawLeadRecord,
        insight: &LeadInsight,
        source: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lead>(INSERT_LEAD)
            .bind(record.to_json())
            .bind(insight.score())
            .bind(insight.label().as_str())
            .bind(insight.explanation())
            .bind(&insight.recommendation)
            .bind(source)
            .fetch_one(pool)
            .await
    }

    /// All-or-nothing insert of an accepted batch
    pub async fn create_batch(
        pool: &PgPool,
        rows: &[ScoredRow],
        source: &str,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for row in rows {
            sqlx::query(INSERT_LEAD)
                .bind(row.record.to_json())
                .bind(row.insight.score())
                .bind(row.insight.label().as_str())
                .bind(row.insight.explanation())
                .bind(&row.insight.recommendation)
                .bind(source)
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Dashboard listing, highest score first
    pub async fn list(pool: &PgPool, filter: &LeadFilter) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE ($1::text IS NULL OR label = $1)
            ORDER BY score DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&filter.label)
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        update: &UpdateLeadStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
            SET is_contacted = $2, status_notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.is_contacted)
        .bind(&update.status_notes)
        .fetch_optional(pool)
        .await
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Admin record as exposed to clients. The password hash lives only in
/// `auth::DbAdminAuth` and never crosses the serialization boundary.
#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub country: String,
    pub job_title: String,
    pub job_details: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRow {
    pub id: Uuid,
    pub name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub benefits: Vec<String>,
    pub tags: Vec<String>,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PastSolutionRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub industry: String,
    pub impact_metrics: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `event_date` is a plain date and serializes as `yyyy-MM-dd`.
#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub event_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::web::{
    ApiMessage, AppState, auth, json_error, models::InquiryRow, responses::parse_id,
};

const COLUMNS: &str =
    "id, name, email, phone, company, country, job_title, job_details, created_at, updated_at";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    job_title: String,
    #[serde(default)]
    job_details: String,
}

#[derive(Serialize)]
pub struct DeletedInquiry {
    message: String,
    inquiry: InquiryRow,
}

pub async fn create_inquiry(
    State(state): State<AppState>,
    Json(payload): Json<InquiryPayload>,
) -> Result<(StatusCode, Json<InquiryRow>), (StatusCode, Json<ApiMessage>)> {
    let fields = [
        payload.name.trim(),
        payload.email.trim(),
        payload.phone.trim(),
        payload.company.trim(),
        payload.country.trim(),
        payload.job_title.trim(),
        payload.job_details.trim(),
    ];
    if fields.iter().any(|field| field.is_empty()) {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    }
    let [name, email, phone, company, country, job_title, job_details] = fields;

    let inquiry = sqlx::query_as::<_, InquiryRow>(&format!(
        "INSERT INTO inquiries (id, name, email, phone, company, country, job_title, job_details)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(company)
    .bind(country)
    .bind(job_title)
    .bind(job_details)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to save inquiry");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save inquiry")
    })?;

    if let Some(notifier) = state.notifier() {
        notifier
            .notify("New Inquiry Submitted", inquiry_notification(&inquiry))
            .await;
    }

    Ok((StatusCode::CREATED, Json(inquiry)))
}

pub async fn list_inquiries(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<Vec<InquiryRow>>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;

    let inquiries = sqlx::query_as::<_, InquiryRow>(&format!(
        "SELECT {COLUMNS} FROM inquiries ORDER BY created_at DESC"
    ))
    .fetch_all(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch inquiries");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to retrieve inquiries",
        )
    })?;

    Ok(Json(inquiries))
}

pub async fn delete_inquiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedInquiry>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid inquiry id")?;

    let deleted = sqlx::query_as::<_, InquiryRow>(&format!(
        "DELETE FROM inquiries WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to delete inquiry");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete inquiry",
        )
    })?;

    let Some(inquiry) = deleted else {
        return Err(json_error(StatusCode::NOT_FOUND, "Inquiry not found"));
    };

    Ok(Json(DeletedInquiry {
        message: "Inquiry deleted successfully".to_string(),
        inquiry,
    }))
}

fn inquiry_notification(inquiry: &InquiryRow) -> String {
    format!(
        "A new inquiry has been submitted:\n\n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         Company: {}\n\
         Country: {}\n\
         Job Title: {}\n\
         Job Details: {}\n",
        inquiry.name,
        inquiry.email,
        inquiry.phone,
        inquiry.company,
        inquiry.country,
        inquiry.job_title,
        inquiry.job_details
    )
}

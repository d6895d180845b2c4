use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::web::{ApiMessage, AppState, auth, json_error, models::PastSolutionRow};

const COLUMNS: &str = "id, title, description, industry, impact_metrics, created_at, updated_at";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastSolutionPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    industry: String,
    #[serde(default)]
    impact_metrics: String,
}

pub async fn create_past_solution(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<PastSolutionPayload>,
) -> Result<(StatusCode, Json<PastSolutionRow>), (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;

    let fields = [
        payload.title.trim(),
        payload.description.trim(),
        payload.industry.trim(),
        payload.impact_metrics.trim(),
    ];
    if fields.iter().any(|field| field.is_empty()) {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    }
    let [title, description, industry, impact_metrics] = fields;

    let solution = sqlx::query_as::<_, PastSolutionRow>(&format!(
        "INSERT INTO past_solutions (id, title, description, industry, impact_metrics)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(industry)
    .bind(impact_metrics)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to save past solution");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error adding past solution",
        )
    })?;

    Ok((StatusCode::CREATED, Json(solution)))
}

pub async fn list_past_solutions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PastSolutionRow>>, (StatusCode, Json<ApiMessage>)> {
    let solutions = sqlx::query_as::<_, PastSolutionRow>(&format!(
        "SELECT {COLUMNS} FROM past_solutions"
    ))
    .fetch_all(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch past solutions");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching past solutions",
        )
    })?;

    Ok(Json(solutions))
}

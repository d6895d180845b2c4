use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::web::{ApiMessage, AppState, auth, json_error, models::AboutRow};

const COLUMNS: &str = "id, title, content, created_at, updated_at";

#[derive(Deserialize)]
pub struct AboutPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

pub async fn get_about(
    State(state): State<AppState>,
) -> Result<Json<AboutRow>, (StatusCode, Json<ApiMessage>)> {
    let about = sqlx::query_as::<_, AboutRow>(&format!(
        "SELECT {COLUMNS} FROM about ORDER BY created_at LIMIT 1"
    ))
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch about content");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching About content",
        )
    })?;

    let Some(about) = about else {
        return Err(json_error(StatusCode::NOT_FOUND, "About content not found"));
    };

    Ok(Json(about))
}

/// Upsert: the about page is a single logical record, created on first write
/// and edited in place afterwards.
pub async fn update_about(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<AboutPayload>,
) -> Result<Json<AboutRow>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;

    let title = payload.title.trim();
    let content = payload.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    }

    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM about ORDER BY created_at LIMIT 1")
            .fetch_optional(state.pool_ref())
            .await
            .map_err(|err| {
                error!(?err, "failed to load about content for update");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error updating About content",
                )
            })?;

    let update_sql = format!(
        "UPDATE about SET title = $2, content = $3, updated_at = NOW() WHERE id = $1
         RETURNING {COLUMNS}"
    );
    let insert_sql = format!(
        "INSERT INTO about (id, title, content) VALUES ($1, $2, $3)
         RETURNING {COLUMNS}"
    );
    let query = match existing {
        Some(id) => sqlx::query_as::<_, AboutRow>(&update_sql)
            .bind(id)
            .bind(title)
            .bind(content),
        None => sqlx::query_as::<_, AboutRow>(&insert_sql)
            .bind(Uuid::new_v4())
            .bind(title)
            .bind(content),
    };

    let about = query.fetch_one(state.pool_ref()).await.map_err(|err| {
        error!(?err, "failed to update about content");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error updating About content",
        )
    })?;

    Ok(Json(about))
}

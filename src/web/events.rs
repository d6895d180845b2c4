use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::web::{
    ApiMessage, AppState, auth, json_error,
    models::EventRow,
    responses::{parse_date, parse_id},
    uploads::{self, EVENT_IMAGE},
};

const COLUMNS: &str =
    "id, title, description, date, location, image, created_at, updated_at";

#[derive(Serialize)]
pub struct DeletedEvent {
    message: String,
    event: EventRow,
}

pub async fn create_event(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<EventRow>), (StatusCode, Json<ApiMessage>)> {
    let admin = auth::require_admin(&state, &jar, &headers).await?;
    auth::require_role(Some(admin))?;

    let payload = uploads::parse_image_form(multipart, state.upload_dir(), &EVENT_IMAGE)
        .await
        .map_err(uploads::upload_error)?;

    let (Some(title), Some(description), Some(date), Some(location)) = (
        payload.text("title"),
        payload.text("description"),
        payload.text("date"),
        payload.text("location"),
    ) else {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    };
    let date = parse_date(date)?;
    let Some(image) = &payload.image else {
        return Err(json_error(StatusCode::BAD_REQUEST, "Image is required"));
    };

    let event = sqlx::query_as::<_, EventRow>(&format!(
        "INSERT INTO upcoming_events (id, title, description, date, location, image)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(date)
    .bind(location)
    .bind(&image.public_path)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to save upcoming event");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error adding upcoming event",
        )
    })?;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventRow>>, (StatusCode, Json<ApiMessage>)> {
    let events = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {COLUMNS} FROM upcoming_events ORDER BY date"
    ))
    .fetch_all(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch upcoming events");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching events")
    })?;

    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventRow>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid event id")?;

    let event = fetch_event(&state, id).await?;
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<EventRow>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;
    let id = parse_id(&id, "Invalid event id")?;

    let existing = fetch_event(&state, id).await?;

    let payload = uploads::parse_image_form(multipart, state.upload_dir(), &EVENT_IMAGE)
        .await
        .map_err(uploads::upload_error)?;

    let title = payload.text("title").unwrap_or(&existing.title);
    let description = payload.text("description").unwrap_or(&existing.description);
    let date = match payload.text("date") {
        Some(raw) => parse_date(raw)?,
        None => existing.date,
    };
    let location = payload.text("location").unwrap_or(&existing.location);
    let image = payload
        .image
        .as_ref()
        .map(|stored| stored.public_path.as_str())
        .unwrap_or(&existing.image);

    let updated = sqlx::query_as::<_, EventRow>(&format!(
        "UPDATE upcoming_events
         SET title = $2, description = $3, date = $4, location = $5, image = $6, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(date)
    .bind(location)
    .bind(image)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to update upcoming event");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error editing event")
    })?;

    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedEvent>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid event id")?;

    let deleted = sqlx::query_as::<_, EventRow>(&format!(
        "DELETE FROM upcoming_events WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to delete upcoming event");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error deleting event")
    })?;

    let Some(event) = deleted else {
        return Err(json_error(StatusCode::NOT_FOUND, "Event not found"));
    };

    Ok(Json(DeletedEvent {
        message: "Event deleted successfully".to_string(),
        event,
    }))
}

async fn fetch_event(
    state: &AppState,
    id: Uuid,
) -> Result<EventRow, (StatusCode, Json<ApiMessage>)> {
    let event = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {COLUMNS} FROM upcoming_events WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch upcoming event");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    event.ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Event not found"))
}

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
    models::PhotoRow,
    responses::{parse_date, parse_id},
    uploads::{self, GALLERY_IMAGE},
};

const COLUMNS: &str =
    "id, title, description, image_url, event_date, created_at, updated_at";

#[derive(Serialize)]
pub struct DeletedPhoto {
    message: String,
    photo: PhotoRow,
}

pub async fn create_photo(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoRow>), (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;

    let payload = uploads::parse_image_form(multipart, state.upload_dir(), &GALLERY_IMAGE)
        .await
        .map_err(uploads::upload_error)?;

    let (Some(title), Some(description), Some(event_date)) = (
        payload.text("title"),
        payload.text("description"),
        payload.text("eventDate"),
    ) else {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    };
    let event_date = parse_date(event_date)?;
    let Some(image) = &payload.image else {
        return Err(json_error(StatusCode::BAD_REQUEST, "Image is required"));
    };

    let photo = sqlx::query_as::<_, PhotoRow>(&format!(
        "INSERT INTO photo_gallery (id, title, description, image_url, event_date)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(&image.public_path)
    .bind(event_date)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to save photo");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error adding photo")
    })?;

    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn list_photos(
    State(state): State<AppState>,
) -> Result<Json<Vec<PhotoRow>>, (StatusCode, Json<ApiMessage>)> {
    let photos = sqlx::query_as::<_, PhotoRow>(&format!(
        "SELECT {COLUMNS} FROM photo_gallery ORDER BY event_date DESC"
    ))
    .fetch_all(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch photos");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to retrieve photos",
        )
    })?;

    Ok(Json(photos))
}

pub async fn get_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PhotoRow>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid photo id")?;

    let photo = fetch_photo(&state, id).await?;
    Ok(Json(photo))
}

pub async fn update_photo(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<PhotoRow>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;
    let id = parse_id(&id, "Invalid photo id")?;

    let existing = fetch_photo(&state, id).await?;

    let payload = uploads::parse_image_form(multipart, state.upload_dir(), &GALLERY_IMAGE)
        .await
        .map_err(uploads::upload_error)?;

    let title = payload.text("title").unwrap_or(&existing.title);
    let description = payload.text("description").unwrap_or(&existing.description);
    let event_date = match payload.text("eventDate") {
        Some(raw) => parse_date(raw)?,
        None => existing.event_date,
    };
    let image_url = payload
        .image
        .as_ref()
        .map(|stored| stored.public_path.as_str())
        .unwrap_or(&existing.image_url);

    let updated = sqlx::query_as::<_, PhotoRow>(&format!(
        "UPDATE photo_gallery
         SET title = $2, description = $3, image_url = $4, event_date = $5, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(image_url)
    .bind(event_date)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to update photo");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error editing photo")
    })?;

    Ok(Json(updated))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeletedPhoto>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;
    let id = parse_id(&id, "Invalid photo id")?;

    let deleted = sqlx::query_as::<_, PhotoRow>(&format!(
        "DELETE FROM photo_gallery WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to delete photo");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete photo")
    })?;

    let Some(photo) = deleted else {
        return Err(json_error(StatusCode::NOT_FOUND, "Photo not found"));
    };

    Ok(Json(DeletedPhoto {
        message: "Photo deleted successfully".to_string(),
        photo,
    }))
}

async fn fetch_photo(
    state: &AppState,
    id: Uuid,
) -> Result<PhotoRow, (StatusCode, Json<ApiMessage>)> {
    let photo = sqlx::query_as::<_, PhotoRow>(&format!(
        "SELECT {COLUMNS} FROM photo_gallery WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch photo");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    photo.ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Photo not found"))
}

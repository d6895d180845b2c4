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
    models::SolutionRow,
    responses::parse_id,
    uploads::{self, GALLERY_IMAGE},
};

const COLUMNS: &str =
    "id, title, description, benefits, tags, image, created_at, updated_at";

#[derive(Serialize)]
pub struct DeletedSolution {
    message: String,
    solution: SolutionRow,
}

pub async fn create_solution(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SolutionRow>), (StatusCode, Json<ApiMessage>)> {
    let payload = uploads::parse_image_form(multipart, state.upload_dir(), &GALLERY_IMAGE)
        .await
        .map_err(uploads::upload_error)?;

    let (Some(title), Some(description), Some(benefits), Some(tags)) = (
        payload.text("title"),
        payload.text("description"),
        payload.text("benefits"),
        payload.text("tags"),
    ) else {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    };
    let Some(image) = &payload.image else {
        return Err(json_error(StatusCode::BAD_REQUEST, "Image is required"));
    };

    let solution = sqlx::query_as::<_, SolutionRow>(&format!(
        "INSERT INTO software_solutions (id, title, description, benefits, tags, image)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(split_list(benefits))
    .bind(split_list(tags))
    .bind(&image.public_path)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to save software solution");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error adding software solution",
        )
    })?;

    Ok((StatusCode::CREATED, Json(solution)))
}

pub async fn list_solutions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SolutionRow>>, (StatusCode, Json<ApiMessage>)> {
    let solutions = sqlx::query_as::<_, SolutionRow>(&format!(
        "SELECT {COLUMNS} FROM software_solutions"
    ))
    .fetch_all(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch software solutions");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching software solutions",
        )
    })?;

    Ok(Json(solutions))
}

pub async fn get_solution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SolutionRow>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid solution id")?;

    let solution = fetch_solution(&state, id).await?;
    Ok(Json(solution))
}

pub async fn update_solution(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<SolutionRow>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;
    let id = parse_id(&id, "Invalid solution id")?;

    let existing = fetch_solution(&state, id).await?;

    let payload = uploads::parse_image_form(multipart, state.upload_dir(), &GALLERY_IMAGE)
        .await
        .map_err(uploads::upload_error)?;

    // Absent fields keep their prior value; a new image replaces the path
    // without removing the old file.
    let title = payload.text("title").unwrap_or(&existing.title);
    let description = payload.text("description").unwrap_or(&existing.description);
    let benefits = payload
        .text("benefits")
        .map(split_list)
        .unwrap_or(existing.benefits.clone());
    let tags = payload
        .text("tags")
        .map(split_list)
        .unwrap_or(existing.tags.clone());
    let image = payload
        .image
        .as_ref()
        .map(|stored| stored.public_path.as_str())
        .unwrap_or(&existing.image);

    let updated = sqlx::query_as::<_, SolutionRow>(&format!(
        "UPDATE software_solutions
         SET title = $2, description = $3, benefits = $4, tags = $5, image = $6, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(benefits)
    .bind(tags)
    .bind(image)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to update software solution");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error editing solution")
    })?;

    Ok(Json(updated))
}

pub async fn delete_solution(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeletedSolution>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;
    let id = parse_id(&id, "Invalid solution id")?;

    let deleted = sqlx::query_as::<_, SolutionRow>(&format!(
        "DELETE FROM software_solutions WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to delete software solution");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete solution",
        )
    })?;

    let Some(solution) = deleted else {
        return Err(json_error(StatusCode::NOT_FOUND, "Solution not found"));
    };

    Ok(Json(DeletedSolution {
        message: "Solution deleted successfully".to_string(),
        solution,
    }))
}

async fn fetch_solution(
    state: &AppState,
    id: Uuid,
) -> Result<SolutionRow, (StatusCode, Json<ApiMessage>)> {
    let solution = sqlx::query_as::<_, SolutionRow>(&format!(
        "SELECT {COLUMNS} FROM software_solutions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch software solution");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    solution.ok_or_else(|| json_error(StatusCode::NOT_FOUND, "Solution not found"))
}

/// Split a comma-delimited field into trimmed, non-empty entries. Clients
/// always receive these as arrays, never as the raw delimited string.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_entries() {
        assert_eq!(split_list("Fast,Reliable"), vec!["Fast", "Reliable"]);
        assert_eq!(
            split_list("  Fast , Reliable , "),
            vec!["Fast", "Reliable"]
        );
    }

    #[test]
    fn split_list_drops_empty_entries() {
        assert_eq!(split_list(",,"), Vec::<String>::new());
        assert_eq!(split_list("solo"), vec!["solo"]);
    }
}

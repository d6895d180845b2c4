use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::web::{
    ApiMessage, AppState, json_error, models::FeedbackRow, responses::parse_id,
};

const COLUMNS: &str = "id, name, rating, comment, created_at, updated_at";

#[derive(Deserialize)]
pub struct CreateFeedbackPayload {
    #[serde(default)]
    name: String,
    rating: Option<i16>,
    #[serde(default)]
    comment: String,
}

#[derive(Deserialize)]
pub struct UpdateFeedbackPayload {
    rating: Option<i16>,
    comment: Option<String>,
}

#[derive(Serialize)]
pub struct DeletedFeedback {
    message: String,
    feedback: FeedbackRow,
}

pub async fn create_feedback(
    State(state): State<AppState>,
    Json(payload): Json<CreateFeedbackPayload>,
) -> Result<(StatusCode, Json<FeedbackRow>), (StatusCode, Json<ApiMessage>)> {
    let name = payload.name.trim();
    let comment = payload.comment.trim();
    let Some(rating) = payload.rating else {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    };
    if name.is_empty() || comment.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    }
    validate_rating(rating)?;

    let feedback = sqlx::query_as::<_, FeedbackRow>(&format!(
        "INSERT INTO feedback (id, name, rating, comment) VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(rating)
    .bind(comment)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to save feedback");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error adding feedback")
    })?;

    if let Some(notifier) = state.notifier() {
        notifier
            .notify("New Feedback Submitted", feedback_notification(&feedback))
            .await;
    }

    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn list_feedback(
    State(state): State<AppState>,
) -> Result<Json<Vec<FeedbackRow>>, (StatusCode, Json<ApiMessage>)> {
    let feedback =
        sqlx::query_as::<_, FeedbackRow>(&format!("SELECT {COLUMNS} FROM feedback"))
            .fetch_all(state.pool_ref())
            .await
            .map_err(|err| {
                error!(?err, "failed to fetch feedback");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching feedback")
            })?;

    Ok(Json(feedback))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateFeedbackPayload>,
) -> Result<Json<FeedbackRow>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid feedback id")?;

    let existing = sqlx::query_as::<_, FeedbackRow>(&format!(
        "SELECT {COLUMNS} FROM feedback WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to fetch feedback for update");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error updating feedback")
    })?;
    let Some(existing) = existing else {
        return Err(json_error(StatusCode::NOT_FOUND, "Feedback not found"));
    };

    let rating = match payload.rating {
        Some(rating) => {
            validate_rating(rating)?;
            rating
        }
        None => existing.rating,
    };
    let comment = payload
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|comment| !comment.is_empty())
        .unwrap_or(&existing.comment)
        .to_string();

    let updated = sqlx::query_as::<_, FeedbackRow>(&format!(
        "UPDATE feedback SET rating = $2, comment = $3, updated_at = NOW() WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(rating)
    .bind(comment)
    .fetch_one(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to update feedback");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Error updating feedback")
    })?;

    Ok(Json(updated))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedFeedback>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid feedback id")?;

    let deleted = sqlx::query_as::<_, FeedbackRow>(&format!(
        "DELETE FROM feedback WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to delete feedback");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to delete feedback",
        )
    })?;

    let Some(feedback) = deleted else {
        return Err(json_error(StatusCode::NOT_FOUND, "Feedback not found"));
    };

    Ok(Json(DeletedFeedback {
        message: "Feedback deleted successfully".to_string(),
        feedback,
    }))
}

fn validate_rating(rating: i16) -> Result<(), (StatusCode, Json<ApiMessage>)> {
    if !(1..=5).contains(&rating) {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5",
        ));
    }
    Ok(())
}

fn feedback_notification(feedback: &FeedbackRow) -> String {
    format!(
        "A new feedback has been submitted:\n\n\
         Name: {}\n\
         Rating: {}\n\
         Comment: {}\n",
        feedback.name, feedback.rating, feedback.comment
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }
}

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tokio::try_join;
use tracing::error;
use uuid::Uuid;

use crate::web::{
    ApiMessage, AppState, auth, json_error, models::AdminRow, responses::parse_id,
};

#[derive(Deserialize)]
pub struct CreateAdminPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

#[derive(Serialize)]
pub struct StatisticsResponse {
    inquiries: i64,
    feedback: i64,
    solutions: i64,
    events: i64,
    photos: i64,
    admins: i64,
}

#[derive(Serialize)]
pub struct DeletedAdmin {
    message: String,
    admin: AdminRow,
}

pub async fn list_admins(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminRow>>, (StatusCode, Json<ApiMessage>)> {
    let admins =
        sqlx::query_as::<_, AdminRow>("SELECT id, name, email FROM admins ORDER BY created_at")
            .fetch_all(state.pool_ref())
            .await
            .map_err(|err| {
                error!(?err, "failed to fetch admins");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to retrieve admins",
                )
            })?;

    Ok(Json(admins))
}

pub async fn create_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<CreateAdminPayload>,
) -> Result<(StatusCode, Json<ApiMessage>), (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;

    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    }

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM admins WHERE email = $1")
        .bind(email)
        .fetch_optional(state.pool_ref())
        .await
        .map_err(|err| {
            error!(?err, "failed to check for duplicate admin email");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create admin")
        })?;
    if existing.is_some() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "Admin with this email already exists",
        ));
    }

    let password_hash = auth::hash_password(&payload.password).map_err(|err| {
        error!(?err, "failed to hash password while creating admin");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create admin")
    })?;

    let result =
        sqlx::query("INSERT INTO admins (id, name, email, password_hash) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .execute(state.pool_ref())
            .await;

    match result {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(ApiMessage::new("Admin created successfully")),
        )),
        // The pre-check races with concurrent creates; the unique index has
        // the final word.
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            Err(json_error(
                StatusCode::BAD_REQUEST,
                "Admin with this email already exists",
            ))
        }
        Err(err) => {
            error!(?err, "failed to create admin");
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create admin",
            ))
        }
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<ApiMessage>, (StatusCode, Json<ApiMessage>)> {
    let admin = auth::require_admin(&state, &jar, &headers).await?;

    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "All fields are required",
        ));
    }

    let record = auth::fetch_admin_auth_by_id(state.pool_ref(), admin.id)
        .await
        .map_err(|err| {
            error!(?err, "failed to load admin for password change");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to change password",
            )
        })?;
    let Some(record) = record else {
        return Err(json_error(StatusCode::NOT_FOUND, "Admin not found"));
    };

    if !auth::verify_password(&payload.current_password, &record.password_hash) {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "Incorrect current password",
        ));
    }

    let password_hash = auth::hash_password(&payload.new_password).map_err(|err| {
        error!(?err, "failed to hash new password");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to change password",
        )
    })?;

    let result =
        sqlx::query("UPDATE admins SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(record.id)
            .bind(password_hash)
            .execute(state.pool_ref())
            .await
            .map_err(|err| {
                error!(?err, "failed to update admin password");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to change password",
                )
            })?;

    if result.rows_affected() == 0 {
        return Err(json_error(StatusCode::NOT_FOUND, "Admin not found"));
    }

    Ok(Json(ApiMessage::new("Password changed successfully")))
}

pub async fn delete_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedAdmin>, (StatusCode, Json<ApiMessage>)> {
    let id = parse_id(&id, "Invalid admin id")?;

    let deleted = sqlx::query_as::<_, AdminRow>(
        "DELETE FROM admins WHERE id = $1 RETURNING id, name, email",
    )
    .bind(id)
    .fetch_optional(state.pool_ref())
    .await
    .map_err(|err| {
        error!(?err, "failed to delete admin");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete admin")
    })?;

    let Some(admin) = deleted else {
        return Err(json_error(StatusCode::NOT_FOUND, "Admin not found"));
    };

    Ok(Json(DeletedAdmin {
        message: "Admin deleted successfully".to_string(),
        admin,
    }))
}

pub async fn statistics(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<StatisticsResponse>, (StatusCode, Json<ApiMessage>)> {
    auth::require_admin(&state, &jar, &headers).await?;

    let pool = state.pool_ref();
    let counts = try_join!(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inquiries").fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM feedback").fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM software_solutions").fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM upcoming_events").fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photo_gallery").fetch_one(pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins").fetch_one(pool),
    );

    let (inquiries, feedback, solutions, events, photos, admins) = counts.map_err(|err| {
        error!(?err, "failed to fetch statistics");
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch statistics",
        )
    })?;

    Ok(Json(StatisticsResponse {
        inquiries,
        feedback,
        solutions,
        events,
        photos,
        admins,
    }))
}

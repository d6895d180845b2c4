use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};

use crate::web::{
    AppState, about, admin, auth, events, feedback, inquiries, past_solutions, photos, solutions,
};

/// Outer request-body ceiling. Per-route upload policies apply their own
/// stricter limits while streaming.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Result<Router> {
    let origin: HeaderValue = state
        .cors_origin()
        .parse()
        .context("CORS_ORIGIN is not a valid header value")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let mut app = Router::new()
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/statistics", get(admin::statistics))
        .route("/api/admin/password", put(admin::change_password))
        .route(
            "/api/admin",
            get(admin::list_admins).post(admin::create_admin),
        )
        .route("/api/admin/:id", delete(admin::delete_admin))
        .route("/api/auth/check", get(auth::auth_check))
        .route("/api/about", get(about::get_about).put(about::update_about))
        .route(
            "/api/inquiries",
            get(inquiries::list_inquiries).post(inquiries::create_inquiry),
        )
        .route("/api/inquiries/:id", delete(inquiries::delete_inquiry))
        .route(
            "/api/feedback",
            get(feedback::list_feedback).post(feedback::create_feedback),
        )
        .route(
            "/api/feedback/:id",
            put(feedback::update_feedback).delete(feedback::delete_feedback),
        )
        .route(
            "/api/software-solutions",
            get(solutions::list_solutions).post(solutions::create_solution),
        )
        .route(
            "/api/software-solutions/:id",
            get(solutions::get_solution)
                .put(solutions::update_solution)
                .delete(solutions::delete_solution),
        )
        .route(
            "/api/past-solutions",
            get(past_solutions::list_past_solutions).post(past_solutions::create_past_solution),
        )
        .route(
            "/api/photos",
            get(photos::list_photos).post(photos::create_photo),
        )
        .route(
            "/api/photos/:id",
            get(photos::get_photo)
                .put(photos::update_photo)
                .delete(photos::delete_photo),
        )
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/api/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .nest_service("/uploads", ServeDir::new(state.upload_dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors);

    if state.is_production() {
        let frontend = ServeDir::new("frontend/dist")
            .not_found_service(ServeFile::new("frontend/dist/index.html"));
        app = app.fallback_service(frontend);
    }

    Ok(app.with_state(state))
}

pub mod about;
pub mod admin;
pub mod auth;
pub mod events;
pub mod feedback;
pub mod inquiries;
pub mod models;
pub mod past_solutions;
pub mod photos;
pub mod responses;
pub mod router;
pub mod solutions;
pub mod state;
pub mod uploads;

pub use auth::{AuthAdmin, SESSION_COOKIE, TOKEN_TTL_SECS};
pub use responses::{ApiMessage, json_error};
pub use state::AppState;

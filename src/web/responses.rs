use axum::Json;
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Canonical JSON payload for message-only responses.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Helper for controllers that need to return `(StatusCode, Json<ApiMessage>)`.
pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiMessage>) {
    (status, Json(ApiMessage::new(message)))
}

/// Parse a path id, rejecting malformed values before any query runs.
pub fn parse_id(raw: &str, message: &str) -> Result<Uuid, (StatusCode, Json<ApiMessage>)> {
    Uuid::parse_str(raw).map_err(|_| json_error(StatusCode::BAD_REQUEST, message))
}

/// Parse a date field as sent by the frontend's date inputs.
pub fn parse_date(raw: &str) -> Result<NaiveDate, (StatusCode, Json<ApiMessage>)> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "Invalid date, expected yyyy-MM-dd"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Invalid id").unwrap(), id);
    }

    #[test]
    fn parse_id_rejects_malformed_value() {
        let err = parse_id("not-a-uuid", "Invalid id").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.0.message, "Invalid id");
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date("2025-11-03").unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("03/11/2025").is_err());
        assert!(parse_date("not a date").is_err());
    }
}

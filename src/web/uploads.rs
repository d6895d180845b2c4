#![allow(dead_code)]

use std::{collections::HashMap, path::Path};

use axum::{Json, extract::Multipart, http::StatusCode};
use chrono::Utc;
use thiserror::Error;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{error, warn};

use crate::web::{ApiMessage, json_error};

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];
const IMAGE_MIMES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// Byte ceiling applied to event images.
pub const EVENT_IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Expectations for the single file field a route accepts. Routes differ on
/// purpose: events carry a hard size cap, gallery/solution images do not.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub field_name: &'static str,
    pub allowed_extensions: &'static [&'static str],
    pub allowed_mime: &'static [&'static str],
    pub max_bytes: Option<u64>,
}

pub const EVENT_IMAGE: UploadPolicy = UploadPolicy {
    field_name: "image",
    allowed_extensions: IMAGE_EXTENSIONS,
    allowed_mime: IMAGE_MIMES,
    max_bytes: Some(EVENT_IMAGE_MAX_BYTES),
};

pub const GALLERY_IMAGE: UploadPolicy = UploadPolicy {
    field_name: "image",
    allowed_extensions: IMAGE_EXTENSIONS,
    allowed_mime: IMAGE_MIMES,
    max_bytes: None,
};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    TooLarge(String),
    #[error("Invalid upload form: {0}")]
    Malformed(String),
    #[error("failed to store upload")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Translate an upload failure into the canonical error body. Storage
/// failures are logged and masked.
pub fn upload_error(err: UploadError) -> (StatusCode, Json<ApiMessage>) {
    match err {
        UploadError::Storage(io_err) => {
            error!(?io_err, "failed to store upload");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store uploaded image",
            )
        }
        other => json_error(other.status(), other.to_string()),
    }
}

/// A stored upload, addressed by the root-relative path clients consume.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub original_name: String,
    pub stored_name: String,
    pub public_path: String,
    pub file_size: u64,
}

/// Parsed multipart form: at most one image plus the plain text fields.
#[derive(Debug, Default)]
pub struct FormPayload {
    pub image: Option<StoredImage>,
    fields: HashMap<String, String>,
}

impl FormPayload {
    /// Trimmed text value for a field; None when absent or blank, so the
    /// same accessor serves required-field checks and partial updates.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}

/// Parse a multipart form, persisting the image (if any) under the upload
/// directory. The file is validated and streamed chunk-by-chunk; a policy
/// size cap aborts the write as soon as it is crossed, before the body is
/// ever fully buffered.
pub async fn parse_image_form(
    mut multipart: Multipart,
    upload_dir: &Path,
    policy: &UploadPolicy,
) -> Result<FormPayload, UploadError> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let mut payload = FormPayload::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Malformed(err.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if field.file_name().is_none() {
            let value = field
                .text()
                .await
                .map_err(|err| UploadError::Malformed(err.to_string()))?;
            payload.fields.entry(field_name).or_insert(value);
            continue;
        }

        if field_name != policy.field_name {
            return Err(UploadError::Malformed(format!(
                "unexpected file field `{field_name}`"
            )));
        }
        if payload.image.is_some() {
            return Err(UploadError::Malformed(format!(
                "only one `{}` file is accepted",
                policy.field_name
            )));
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        validate_file(policy, &original_name, &content_type)?;

        let stored_name = stored_file_name(
            policy.field_name,
            &original_name,
            Utc::now().timestamp_millis(),
        );
        let stored_path = upload_dir.join(&stored_name);

        let mut file = File::create(&stored_path).await?;
        let mut total_bytes: u64 = 0;

        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    remove_partial(&stored_path).await;
                    return Err(UploadError::Malformed(err.to_string()));
                }
            };

            total_bytes += chunk.len() as u64;
            if let Some(max_bytes) = policy.max_bytes {
                if total_bytes > max_bytes {
                    remove_partial(&stored_path).await;
                    return Err(UploadError::TooLarge(format!(
                        "Image exceeds the {} MB upload limit",
                        max_bytes / (1024 * 1024)
                    )));
                }
            }

            if let Err(err) = file.write_all(&chunk).await {
                remove_partial(&stored_path).await;
                return Err(UploadError::Storage(err));
            }
        }
        file.flush().await?;

        payload.image = Some(StoredImage {
            original_name,
            public_path: format!("/uploads/{stored_name}"),
            stored_name,
            file_size: total_bytes,
        });
    }

    Ok(payload)
}

/// Both checks must pass: a permitted extension cannot vouch for a bad
/// declared type, nor the other way around.
fn validate_file(
    policy: &UploadPolicy,
    original_name: &str,
    content_type: &str,
) -> Result<(), UploadError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let extension_ok = policy
        .allowed_extensions
        .iter()
        .any(|allowed| *allowed == extension);

    let mime_ok = content_type
        .parse::<mime::Mime>()
        .map(|declared| {
            policy
                .allowed_mime
                .iter()
                .any(|allowed| *allowed == declared.essence_str())
        })
        .unwrap_or(false);

    if !extension_ok || !mime_ok {
        return Err(UploadError::UnsupportedMediaType(
            "Only .jpeg, .jpg, .png and .gif images are allowed".to_string(),
        ));
    }

    Ok(())
}

/// `<millisecond-timestamp>-<sanitized-stem-or-field-name>.<ext>`.
fn stored_file_name(field_name: &str, original_name: &str, timestamp_millis: i64) -> String {
    let path = Path::new(original_name);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(sanitize_filename::sanitize)
        .unwrap_or_default();
    let base = if stem.is_empty() {
        field_name.to_string()
    } else {
        stem
    };
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if extension.is_empty() {
        format!("{timestamp_millis}-{base}")
    } else {
        format!("{timestamp_millis}-{base}.{extension}")
    }
}

async fn remove_partial(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        warn!(?err, file = %path.display(), "failed to remove partial upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_extension_even_with_good_mime() {
        let err = validate_file(&EVENT_IMAGE, "payload.exe", "image/png").unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedMediaType(_)));
    }

    #[test]
    fn rejects_bad_mime_even_with_good_extension() {
        let err = validate_file(&EVENT_IMAGE, "photo.png", "application/octet-stream").unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedMediaType(_)));
    }

    #[test]
    fn rejects_unparseable_content_type() {
        assert!(validate_file(&EVENT_IMAGE, "photo.png", "").is_err());
    }

    #[test]
    fn accepts_image_with_matching_type() {
        assert!(validate_file(&EVENT_IMAGE, "photo.png", "image/png").is_ok());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_file(&GALLERY_IMAGE, "PHOTO.JPG", "image/jpeg").is_ok());
    }

    #[test]
    fn stored_name_carries_timestamp_and_extension() {
        assert_eq!(
            stored_file_name("image", "team photo.PNG", 1699000000000),
            "1699000000000-team photo.png"
        );
    }

    #[test]
    fn stored_name_falls_back_to_field_name() {
        assert_eq!(
            stored_file_name("image", "", 1699000000000),
            "1699000000000-image"
        );
    }

    #[test]
    fn text_fields_drop_blank_values() {
        let payload = FormPayload::default()
            .with_field("title", "  Launch day  ")
            .with_field("description", "   ");
        assert_eq!(payload.text("title"), Some("Launch day"));
        assert_eq!(payload.text("description"), None);
        assert_eq!(payload.text("missing"), None);
    }
}

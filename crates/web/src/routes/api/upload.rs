//! Image upload from the admin editor.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::uploads::{MAX_UPLOAD_BYTES, UploadError, validate_upload};

/// Form field carrying the file.
const FILE_FIELD: &str = "file";

/// Request body limit for the upload route: the file plus multipart overhead.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    /// Where the stored file is served.
    pub url: String,
}

/// Public path of a stored upload.
fn upload_url(stored_name: &str) -> String {
    format!("/uploads/{stored_name}")
}

/// A body cut off by the route's size limit is an oversized file.
fn multipart_error(e: &MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return UploadError::TooLarge.into();
    }
    tracing::warn!(error = %e, "malformed multipart body");
    ApiError::bad_request("Invalid form data")
}

/// Read the validated `file` field as (original name, bytes).
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() == Some(FILE_FIELD) {
            return read_file(field).await;
        }
    }
    Err(UploadError::Missing.into())
}

async fn read_file(field: Field<'_>) -> Result<(String, Bytes), ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let content_type = field.content_type().map(str::to_owned);

    // Reject by declared type before reading the body.
    validate_upload(content_type.as_deref(), 0)?;

    let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
    validate_upload(content_type.as_deref(), bytes.len())?;
    Ok((file_name, bytes))
}

/// `POST /api/upload` (multipart, field `file`).
///
/// # Errors
///
/// 400 without a file, for a non-image type or a file over 5MB; 401 for
/// non-admins; 500 if the file cannot be written.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadedFile>> {
    let (file_name, bytes) = read_file_field(&mut multipart).await?;
    let stored = state.uploads().save(&file_name, &bytes).await?;
    Ok(Json(UploadedFile {
        url: upload_url(&stored),
    }))
}

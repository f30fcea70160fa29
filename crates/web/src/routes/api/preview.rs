//! Markdown preview for the admin editor.

use axum::{
    Json,
    extract::rejection::JsonRejection,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::error::ApiResult;
use crate::markdown::render_markdown;
use crate::middleware::RequireAdmin;

#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewHtml {
    pub html: String,
}

/// `POST /api/preview`: render the editor's markdown the way the post page will.
///
/// # Errors
///
/// 400 for a malformed body, 401 for non-admins.
pub async fn preview(
    _admin: RequireAdmin,
    body: Result<Json<PreviewBody>, JsonRejection>,
) -> ApiResult<Json<PreviewHtml>> {
    let body = json_body(body)?;
    Ok(Json(PreviewHtml {
        html: render_markdown(&body.content),
    }))
}

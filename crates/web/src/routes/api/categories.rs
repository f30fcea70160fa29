//! `/api/categories` handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use techblog_core::CategoryId;
use techblog_core::slug::slugify;

use super::json_body;
use crate::db::CategoryRepository;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireAdmin;
use crate::models::CategoryWithCount;
use crate::state::AppState;

/// `GET /api/categories`: every category with its post count, drafts included.
///
/// # Errors
///
/// 500 on database errors.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> ApiResult<Json<Vec<CategoryWithCount>>> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(false)
        .await?;
    Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryBody {
    #[serde(default)]
    pub name: Option<String>,
}

/// Trimmed name and its slug, or the 400 to answer with.
fn name_and_slug(name: Option<&str>) -> Result<(String, String), ApiError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ApiError::bad_request("Name must contain letters or digits"));
    }
    Ok((name.to_owned(), slug))
}

/// `POST /api/categories`.
///
/// # Errors
///
/// 400 for a blank name, 409 if the name or slug exists, 401 for non-admins.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    body: Result<Json<CreateCategoryBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let body = json_body(body)?;
    let (name, slug) = name_and_slug(body.name.as_deref())?;

    let category = CategoryRepository::new(state.pool())
        .create(&name, &slug)
        .await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteCategoryBody {
    pub id: CategoryId,
}

/// `DELETE /api/categories` with `{"id": n}`.
///
/// Posts in the category become uncategorized.
///
/// # Errors
///
/// 404 if the category does not exist, 401 for non-admins.
#[instrument(skip_all)]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    body: Result<Json<DeleteCategoryBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let DeleteCategoryBody { id } = json_body(body)?;
    CategoryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(category_id = %id, "category deleted");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_slug() {
        let (name, slug) = name_and_slug(Some("  Web Dev ")).unwrap();
        assert_eq!(name, "Web Dev");
        assert_eq!(slug, "web-dev");
    }

    #[test]
    fn test_name_required() {
        for name in [None, Some(""), Some("   ")] {
            let err = name_and_slug(name).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.message(), "Name is required");
        }
    }

    #[test]
    fn test_delete_body_takes_numeric_id() {
        let body: DeleteCategoryBody = serde_json::from_str(r#"{"id":5}"#).unwrap();
        assert_eq!(body.id, CategoryId::new(5));
    }
}

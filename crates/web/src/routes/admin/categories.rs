//! Admin category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use techblog_core::CategoryId;
use techblog_core::slug::slugify;

use super::AdminNavView;
use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CategoryWithCount, CurrentUser};
use crate::state::AppState;

const CATEGORIES_PATH: &str = "/admin/categories";

const HAS_POSTS: &str = "글이 있는 카테고리는 삭제할 수 없습니다.";
const NAME_REQUIRED: &str = "카테고리 이름을 입력해주세요.";
const NAME_TAKEN: &str = "이미 있는 카테고리입니다.";

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub name: String,
    pub slug: String,
    pub post_count: i64,
    pub deletable: bool,
    pub delete_action: String,
}

impl From<&CategoryWithCount> for CategoryRow {
    fn from(c: &CategoryWithCount) -> Self {
        Self {
            name: c.category.name.clone(),
            slug: c.category.slug.clone(),
            post_count: c.post_count,
            deletable: c.is_deletable(),
            delete_action: format!("{CATEGORIES_PATH}/{}/delete", c.category.id),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/index.html")]
pub struct CategoriesTemplate {
    pub nav: AdminNavView,
    pub categories: Vec<CategoryRow>,
    pub error: Option<&'static str>,
}

async fn page(
    state: &AppState,
    admin: &CurrentUser,
    error: Option<&'static str>,
) -> Result<CategoriesTemplate> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(false)
        .await?;
    Ok(CategoriesTemplate {
        nav: AdminNavView::new(admin, CATEGORIES_PATH),
        categories: categories.iter().map(CategoryRow::from).collect(),
        error,
    })
}

/// Re-show the page with an error.
async fn refused(
    state: &AppState,
    admin: &CurrentUser,
    status: StatusCode,
    message: &'static str,
) -> Result<Response> {
    Ok((status, page(state, admin, Some(message)).await?).into_response())
}

/// `GET /admin/categories`.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    page(&state, &admin, None).await
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

/// `POST /admin/categories`.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip(admin, state))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let name = form.name.trim();
    let slug = slugify(name);
    if name.is_empty() || slug.is_empty() {
        return refused(&state, &admin, StatusCode::UNPROCESSABLE_ENTITY, NAME_REQUIRED).await;
    }

    match CategoryRepository::new(state.pool()).create(name, &slug).await {
        Ok(category) => {
            tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
            Ok(Redirect::to(CATEGORIES_PATH).into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            refused(&state, &admin, StatusCode::CONFLICT, NAME_TAKEN).await
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /admin/categories/{id}/delete`.
///
/// Categories that still hold posts (drafts included) are kept.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let repo = CategoryRepository::new(state.pool());
    if repo.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound(format!("category {id}")));
    }

    if repo.post_count(id).await? > 0 {
        tracing::info!(category_id = %id, "refused to delete category with posts");
        return refused(&state, &admin, StatusCode::CONFLICT, HAS_POSTS).await;
    }

    repo.delete(id).await?;
    tracing::info!(category_id = %id, "category deleted");
    Ok(Redirect::to(CATEGORIES_PATH).into_response())
}

//! `/api/posts` handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use techblog_core::PostId;
use techblog_core::pagination::{PageRequest, parse_page};

use super::{category_id_from_json, double_option, json_body};
use crate::db::{AdminPostQuery, PostRepository};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{OptionalUser, RequireAdmin, viewer_is_admin};
use crate::models::{Post, PostFilter};
use crate::services::posts::{PostDraft, PostEdit, PostService};
use crate::state::AppState;

/// Query string of `GET /api/posts`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiListQuery {
    /// Any non-empty value asks for every post, drafts included (admin only).
    pub all: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

impl ApiListQuery {
    fn wants_all(&self) -> bool {
        self.all.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Page size; missing, zero or malformed means "no paging".
    fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(0)
    }

    fn filter(&self) -> PostFilter {
        PostFilter::published()
            .with_query(self.q.as_deref())
            .with_category(self.category.as_deref())
            .with_tags(self.tags.as_deref())
    }
}

/// `{posts, totalCount}` answer for paged requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_count: u64,
}

/// `GET /api/posts`.
///
/// # Errors
///
/// 401 for `?all` without admin rights, 500 on database errors.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<ApiListQuery>,
) -> ApiResult<Response> {
    let repo = PostRepository::new(state.pool());

    if query.wants_all() {
        if !viewer_is_admin(&state, user.as_ref()).await {
            return Err(ApiError::unauthorized());
        }
        let posts = repo.list_for_admin(&AdminPostQuery::default()).await?;
        return Ok(Json(posts).into_response());
    }

    let filter = query.filter();
    let limit = query.limit();

    if limit > 0 {
        let page = PageRequest::new(parse_page(query.page.as_deref()), limit);
        let posts = repo.list(&filter, page).await?;
        let total_count = repo.count(&filter).await?;
        return Ok(Json(PostPage { posts, total_count }).into_response());
    }

    // Unpaged: every match.
    let posts = repo.list(&filter, PageRequest::new(1, u32::MAX)).await?;
    Ok(Json(posts).into_response())
}

/// Body of `POST /api/posts`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub category_id: Value,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl CreatePostBody {
    fn into_draft(self) -> Result<PostDraft, ApiError> {
        Ok(PostDraft {
            category_id: category_id_from_json(&self.category_id)?,
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            excerpt: self.excerpt,
            thumbnail: self.thumbnail,
            published: self.published.unwrap_or(false),
            tags: self.tags.unwrap_or_default(),
        })
    }
}

/// `POST /api/posts`.
///
/// # Errors
///
/// 400 without title or content, 401 for non-admins.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    body: Result<Json<CreatePostBody>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let draft = json_body(body)?.into_draft()?;
    let post = PostService::new(state.pool()).create(draft).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Non-numeric ids can never match a post.
fn parse_post_id(raw: &str) -> Result<PostId, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found())
}

/// `GET /api/posts/{id}`. Drafts are only shown to the admin.
///
/// # Errors
///
/// 404 if the post does not exist or is a draft and the caller is not the admin.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    let id = parse_post_id(&id)?;
    let post = PostRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    if !post.published && !viewer_is_admin(&state, user.as_ref()).await {
        return Err(ApiError::not_found());
    }

    Ok(Json(post))
}

/// Body of `PUT /api/posts/{id}`. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub excerpt: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub thumbnail: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Value>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub published: Option<bool>,
}

impl UpdatePostBody {
    fn into_edit(self) -> Result<PostEdit, ApiError> {
        let category_id = match self.category_id {
            None => None,
            Some(value) => Some(category_id_from_json(&value.unwrap_or(Value::Null))?),
        };

        Ok(PostEdit {
            // An empty title means "unchanged".
            title: self.title.filter(|t| !t.is_empty()),
            content: self.content,
            excerpt: self.excerpt,
            thumbnail: self.thumbnail,
            published: self.published,
            category_id,
            tags: self.tags,
        })
    }
}

/// `PUT /api/posts/{id}`.
///
/// # Errors
///
/// 404 if the post does not exist, 400 for blank content, 401 for non-admins.
#[instrument(skip(state, _admin, body))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    body: Result<Json<UpdatePostBody>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let id = parse_post_id(&id)?;
    let edit = json_body(body)?.into_edit()?;
    let post = PostService::new(state.pool()).update(id, edit).await?;
    Ok(Json(post))
}

/// `DELETE /api/posts/{id}`.
///
/// # Errors
///
/// 404 if the post does not exist, 401 for non-admins.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_post_id(&id)?;
    PostRepository::new(state.pool()).delete(id).await?;
    tracing::info!(post_id = %id, "post deleted");
    Ok(Json(json!({ "success": true })))
}

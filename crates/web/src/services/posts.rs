//! Post creation and editing rules shared by the JSON API and the admin forms.
//!
//! - Title and content are required.
//! - The slug is derived from the title. A slug already used by another post
//!   gets `-{unix millis}` appended; a title with no sluggable characters
//!   gets the millis alone.
//! - Tags are trimmed and deduplicated before they reach the database.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use techblog_core::slug::slugify;
use techblog_core::{CategoryId, PostId};

use crate::db::{PostRepository, RepositoryError};
use crate::models::post::normalize_tags;
use crate::models::{Post, PostChanges, PostInput};

/// Errors from post operations.
#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("Title and content are required")]
    MissingFields,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A post as submitted by the editor, before validation.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub published: bool,
    pub category_id: Option<CategoryId>,
    pub tags: Vec<String>,
}

/// A partial edit as submitted by the editor.
///
/// Outer `None` leaves a field alone. For nullable fields an inner `None`
/// (or an empty string) clears it.
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<Option<String>>,
    pub thumbnail: Option<Option<String>>,
    pub published: Option<bool>,
    pub category_id: Option<Option<CategoryId>>,
    pub tags: Option<Vec<String>>,
}

/// Post operations that carry business rules on top of [`PostRepository`].
pub struct PostService<'a> {
    posts: PostRepository<'a>,
}

impl<'a> PostService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            posts: PostRepository::new(pool),
        }
    }

    /// Validate and insert a new post.
    ///
    /// # Errors
    ///
    /// Returns `PostServiceError::MissingFields` if title or content is blank.
    /// Returns `PostServiceError::Repository` on database errors.
    #[instrument(skip_all, fields(title = %draft.title))]
    pub async fn create(&self, draft: PostDraft) -> Result<Post, PostServiceError> {
        let title = draft.title.trim();
        if title.is_empty() || draft.content.trim().is_empty() {
            return Err(PostServiceError::MissingFields);
        }

        let slug = self.unique_slug(title, None).await?;
        let input = PostInput {
            title: title.to_owned(),
            slug,
            content: draft.content,
            excerpt: non_blank(draft.excerpt),
            thumbnail: non_blank(draft.thumbnail),
            published: draft.published,
            category_id: draft.category_id,
            tags: normalize_tags(draft.tags.iter().map(String::as_str)),
        };

        let post = self.posts.create(&input).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "post created");
        Ok(post)
    }

    /// Validate and apply a partial edit. A changed title re-derives the slug.
    ///
    /// # Errors
    ///
    /// Returns `PostServiceError::MissingFields` if a provided title or
    /// content is blank.
    /// Returns `PostServiceError::Repository` (`NotFound` for a missing post)
    /// on database errors.
    #[instrument(skip_all, fields(post_id = %id))]
    pub async fn update(&self, id: PostId, edit: PostEdit) -> Result<Post, PostServiceError> {
        let title = edit.title.as_deref().map(str::trim);
        if title.is_some_and(str::is_empty)
            || edit.content.as_deref().is_some_and(|c| c.trim().is_empty())
        {
            return Err(PostServiceError::MissingFields);
        }

        let existing = self
            .posts
            .get_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        // The slug only follows the title when the title actually changes.
        let slug = match title {
            Some(title) if title != existing.title => Some(self.unique_slug(title, Some(id)).await?),
            _ => None,
        };

        let changes = PostChanges {
            title: title.map(str::to_owned),
            slug,
            content: edit.content,
            excerpt: edit.excerpt.map(non_blank),
            thumbnail: edit.thumbnail.map(non_blank),
            published: edit.published,
            category_id: edit.category_id,
            tags: edit
                .tags
                .map(|tags| normalize_tags(tags.iter().map(String::as_str))),
        };

        let post = self.posts.update(id, &changes).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "post updated");
        Ok(post)
    }

    /// Slug for `title` that no other post uses.
    async fn unique_slug(
        &self,
        title: &str,
        except: Option<PostId>,
    ) -> Result<String, RepositoryError> {
        let millis = Utc::now().timestamp_millis();
        let base = slugify(title);
        if base.is_empty() {
            return Ok(millis.to_string());
        }
        if self.posts.slug_exists(&base, except).await? {
            return Ok(with_suffix(&base, millis));
        }
        Ok(base)
    }
}

fn with_suffix(base: &str, millis: i64) -> String {
    format!("{base}-{millis}")
}

/// Empty or whitespace-only text becomes `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

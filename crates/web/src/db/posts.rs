//! Post repository.
//!
//! Posts are loaded in two steps: the post rows (with their category joined
//! in), then the tags for all of those posts in a single query.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use techblog_core::pagination::PageRequest;
use techblog_core::{CategoryId, PostId, PostStatus, TagId};

use super::{RepositoryError, map_constraint_error};
use crate::models::{CategorySummary, Post, PostChanges, PostFilter, PostInput, Tag};

const POST_COLUMNS: &str = r"
    p.id, p.title, p.slug, p.content, p.excerpt, p.thumbnail, p.published,
    p.category_id, c.name AS category_name, c.slug AS category_slug,
    p.created_at, p.updated_at
";

/// Shared `WHERE` clause for public listings. Binds `$1..=$4`.
const FILTER_CLAUSE: &str = r"
    ($1::boolean IS NULL OR p.published = $1)
    AND ($2::text IS NULL OR strpos(p.title, $2) > 0 OR strpos(p.content, $2) > 0)
    AND ($3::text IS NULL OR c.slug = $3)
    AND (
        cardinality($4::text[]) = 0
        OR (
            SELECT COUNT(*)
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = p.id AND t.name = ANY($4)
        ) = cardinality($4::text[])
    )
";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: PostId,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    thumbnail: Option<String>,
    published: bool,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    category_slug: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, tags: Vec<Tag>) -> Post {
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategorySummary { id, name, slug }),
            _ => None,
        };

        Post {
            id: self.id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            thumbnail: self.thumbnail,
            published: self.published,
            category_id: self.category_id,
            category,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: PostId,
    id: TagId,
    name: String,
}

/// Counters for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct PostStats {
    pub total: i64,
    pub published: i64,
    pub drafts: i64,
    pub categories: i64,
}

/// Column the admin post table is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminSort {
    Title,
    #[default]
    CreatedAt,
}

impl AdminSort {
    /// Parse the `?sort=` value; anything unknown sorts by creation time.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("title") => Self::Title,
            _ => Self::CreatedAt,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "createdAt",
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Title => "p.title",
            Self::CreatedAt => "p.created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters and ordering for the admin post table.
#[derive(Debug, Clone, Default)]
pub struct AdminPostQuery {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<PostStatus>,
    pub sort: AdminSort,
    pub direction: SortDirection,
}

/// Repository for post database operations.
pub struct PostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of posts matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Vec<Post>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE {FILTER_CLAUSE}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $5 OFFSET $6
            "
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(filter.published)
            .bind(filter.query.as_deref())
            .bind(filter.category_slug.as_deref())
            .bind(&filter.tags)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        self.attach_tags(rows).await
    }

    /// Number of posts matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &PostFilter) -> Result<u64, RepositoryError> {
        let sql = format!(
            r"
            SELECT COUNT(*)
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE {FILTER_CLAUSE}
            "
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.published)
            .bind(filter.query.as_deref())
            .bind(filter.category_slug.as_deref())
            .bind(&filter.tags)
            .fetch_one(self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Every post, drafts included, for the admin table and `GET /api/posts?all=true`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_admin(&self, query: &AdminPostQuery) -> Result<Vec<Post>, RepositoryError> {
        // Sort column and direction come from closed enums, never from input.
        let sql = format!(
            r"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE ($1::text IS NULL OR strpos(lower(p.title), lower($1)) > 0)
              AND ($2::int IS NULL OR p.category_id = $2)
              AND ($3::boolean IS NULL OR p.published = $3)
            ORDER BY {column} {direction}, p.id DESC
            ",
            column = query.sort.column(),
            direction = query.direction.keyword(),
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(query.title.as_deref())
            .bind(query.category_id)
            .bind(query.status.map(PostStatus::is_published))
            .fetch_all(self.pool)
            .await?;

        self.attach_tags(rows).await
    }

    /// Most recently edited posts, drafts included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn recently_updated(&self, limit: i64) -> Result<Vec<Post>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            ORDER BY p.updated_at DESC, p.id DESC
            LIMIT $1
            "
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        self.attach_tags(rows).await
    }

    /// Look up a post by ID regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            "
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(self.attach_tags(row.into_iter().collect()).await?.pop())
    }

    /// Look up a post by slug regardless of status.
    ///
    /// Callers serving the public site must check [`Post::published`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {POST_COLUMNS}
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.slug = $1
            "
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(self.attach_tags(row.into_iter().collect()).await?.pop())
    }

    /// Whether `slug` is used by any post other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(
        &self,
        slug: &str,
        except: Option<PostId>,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE slug = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a post and its tags. Tags that do not exist yet are created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &PostInput) -> Result<Post, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: PostId = sqlx::query_scalar(
            r"
            INSERT INTO posts (title, slug, content, excerpt, thumbnail, published, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.content)
        .bind(input.excerpt.as_deref())
        .bind(input.thumbnail.as_deref())
        .bind(input.published)
        .bind(input.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "slug"))?;

        attach_tag_names(&mut tx, id, &input.tags).await?;
        tx.commit().await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update. Present tags replace the whole tag set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken or the
    /// category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: PostId, changes: &PostChanges) -> Result<Post, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE posts SET
                title       = COALESCE($2, title),
                slug        = COALESCE($3, slug),
                content     = COALESCE($4, content),
                excerpt     = CASE WHEN $5 THEN $6 ELSE excerpt END,
                thumbnail   = CASE WHEN $7 THEN $8 ELSE thumbnail END,
                published   = COALESCE($9, published),
                category_id = CASE WHEN $10 THEN $11 ELSE category_id END,
                updated_at  = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.slug.as_deref())
        .bind(changes.content.as_deref())
        .bind(changes.excerpt.is_some())
        .bind(changes.excerpt.clone().flatten())
        .bind(changes.thumbnail.is_some())
        .bind(changes.thumbnail.clone().flatten())
        .bind(changes.published)
        .bind(changes.category_id.is_some())
        .bind(changes.category_id.flatten())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(tags) = &changes.tags {
            sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            attach_tag_names(&mut tx, id, tags).await?;
        }

        tx.commit().await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a post. Its tag links go with it; the tags themselves stay.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<PostStats, RepositoryError> {
        let stats = sqlx::query_as::<_, PostStats>(
            r"
            SELECT
                COUNT(*)                                AS total,
                COUNT(*) FILTER (WHERE published)       AS published,
                COUNT(*) FILTER (WHERE NOT published)   AS drafts,
                (SELECT COUNT(*) FROM categories)       AS categories
            FROM posts
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    async fn attach_tags(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<PostId> = rows.iter().map(|r| r.id).collect();
        let tag_rows = sqlx::query_as::<_, PostTagRow>(
            r"
            SELECT pt.post_id, t.id, t.name
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name ASC
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_post: HashMap<PostId, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            by_post.entry(row.post_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = by_post.remove(&row.id).unwrap_or_default();
                row.into_post(tags)
            })
            .collect())
    }
}

/// Link `names` to a post, creating tags on first use.
async fn attach_tag_names(
    tx: &mut Transaction<'_, Postgres>,
    post_id: PostId,
    names: &[String],
) -> Result<(), RepositoryError> {
    for name in names {
        let tag_id: TagId = sqlx::query_scalar(
            r"
            INSERT INTO tags (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_sort_parse() {
        assert_eq!(AdminSort::parse(Some("title")), AdminSort::Title);
        assert_eq!(AdminSort::parse(Some("createdAt")), AdminSort::CreatedAt);
        assert_eq!(AdminSort::parse(Some("; DROP TABLE posts")), AdminSort::CreatedAt);
        assert_eq!(AdminSort::parse(None), AdminSort::CreatedAt);
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(None), SortDirection::Desc);
        assert_eq!(SortDirection::Asc.flipped(), SortDirection::Desc);
    }

    #[test]
    fn test_filter_clause_binds_four_params() {
        assert!(FILTER_CLAUSE.contains("$4"));
        assert!(!FILTER_CLAUSE.contains("$5"));
    }
}

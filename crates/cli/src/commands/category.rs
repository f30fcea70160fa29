//! Category management.
//!
//! ```bash
//! techblog-cli category add "Web Dev"   # slug: web-dev
//! techblog-cli category list
//! ```

use thiserror::Error;

use techblog_core::slug::slugify;
use techblog_web::db::{CategoryRepository, RepositoryError};

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Category name must contain letters or digits: {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Trimmed name and derived slug.
fn name_and_slug(name: &str) -> Result<(&str, String), CategoryError> {
    let name = name.trim();
    let slug = slugify(name);
    if name.is_empty() || slug.is_empty() {
        return Err(CategoryError::InvalidName(name.to_owned()));
    }
    Ok((name, slug))
}

/// Add a category.
///
/// # Errors
///
/// Returns `CategoryError::Repository` with a conflict if the name or slug is taken.
pub async fn add(name: &str) -> Result<(), CategoryError> {
    let (name, slug) = name_and_slug(name)?;
    let pool = connect().await?;

    let category = CategoryRepository::new(&pool).create(name, &slug).await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");

    #[allow(clippy::print_stdout)]
    {
        println!("{}\t{}\t{}", category.id, category.slug, category.name);
    }
    Ok(())
}

/// Print every category with its post count, drafts included.
///
/// # Errors
///
/// Returns `CategoryError` if the database is unreachable.
pub async fn list() -> Result<(), CategoryError> {
    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool).list_with_counts(false).await?;

    #[allow(clippy::print_stdout)]
    {
        if categories.is_empty() {
            println!("No categories.");
        }
        for entry in &categories {
            println!(
                "{}\t{}\t{}\t{} posts",
                entry.category.id, entry.category.slug, entry.category.name, entry.post_count
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_slug() {
        let (name, slug) = name_and_slug("  Rust 입문 ").unwrap();
        assert_eq!(name, "Rust 입문");
        assert_eq!(slug, slugify("Rust 입문"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(
            name_and_slug("   "),
            Err(CategoryError::InvalidName(_))
        ));
        assert!(matches!(name_and_slug("!!!"), Err(CategoryError::InvalidName(_))));
    }
}

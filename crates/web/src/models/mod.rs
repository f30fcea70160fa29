//! Domain models for the blog.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod category;
pub mod post;
pub mod session;
pub mod user;

pub use category::{Category, CategoryWithCount};
pub use post::{CategorySummary, Post, PostFilter, PostInput, PostChanges, Tag};
pub use session::CurrentUser;
pub use user::{GithubIdentity, User};

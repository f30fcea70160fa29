//! Publication status for posts.

use serde::{Deserialize, Serialize};

/// Whether a post is visible to readers.
///
/// Stored as the `posts.published` boolean; this enum exists for filters and
/// display where "published"/"draft" reads better than `true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Published,
    Draft,
}

impl PostStatus {
    #[must_use]
    pub const fn from_published(published: bool) -> Self {
        if published { Self::Published } else { Self::Draft }
    }

    #[must_use]
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }

    /// Korean label shown in the admin tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Published => "발행",
            Self::Draft => "임시저장",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Published => write!(f, "published"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Self::Published),
            "draft" => Ok(Self::Draft),
            _ => Err(format!("invalid post status: {s}")),
        }
    }
}

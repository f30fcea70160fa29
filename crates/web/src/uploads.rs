//! Image uploads: validation, naming and on-disk storage.
//!
//! Files land flat in the upload directory as `{unix millis}-{sanitized name}`
//! and are served back from `/uploads/{name}`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted by `POST /api/upload`.
pub const ALLOWED_UPLOAD_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// Extensions served from the upload directory, with their content type.
const SERVED_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
];

/// `Cache-Control` for uploaded files; names are unique so they never change.
pub const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Errors from storing or serving uploads.
///
/// The display strings are the messages returned to API clients.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    Missing,

    #[error("Invalid file type")]
    InvalidType,

    #[error("File too large (max 5MB)")]
    TooLarge,

    #[error("Invalid path")]
    InvalidPath,

    #[error("Not found")]
    NotFound,

    #[error("upload storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check an upload's declared type and size.
///
/// # Errors
///
/// Returns `UploadError::InvalidType` or `UploadError::TooLarge`.
pub fn validate_upload(content_type: Option<&str>, size: usize) -> Result<(), UploadError> {
    let allowed = content_type.is_some_and(|ct| ALLOWED_UPLOAD_TYPES.contains(&ct));
    if !allowed {
        return Err(UploadError::InvalidType);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    Ok(())
}

/// Replace everything except ASCII letters, digits, `.` and `-` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Name an upload is stored under.
#[must_use]
pub fn stored_file_name(original: &str, millis: i64) -> String {
    let original = if original.is_empty() { "upload" } else { original };
    format!("{millis}-{}", sanitize_file_name(original))
}

/// Content type for a served upload, by extension (case-insensitive).
#[must_use]
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    SERVED_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

/// Reject paths that could escape the upload directory.
///
/// # Errors
///
/// Returns `UploadError::InvalidPath` for `..`, absolute paths and backslashes.
pub fn check_relative_path(path: &str) -> Result<(), UploadError> {
    if path.is_empty() || path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(UploadError::InvalidPath);
    }
    Ok(())
}

/// The upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write an upload and return the name it was stored under.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the directory or file cannot be written.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let name = stored_file_name(original_name, Utc::now().timestamp_millis());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::info!(file = %name, bytes = bytes.len(), "upload stored");
        Ok(name)
    }

    /// Read a stored upload and its content type.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidPath` for unsafe paths,
    /// `UploadError::InvalidType` for unknown extensions and
    /// `UploadError::NotFound` if the file cannot be read.
    pub async fn read(&self, path: &str) -> Result<(Vec<u8>, &'static str), UploadError> {
        check_relative_path(path)?;
        let content_type = content_type_for(path).ok_or(UploadError::InvalidType)?;

        match tokio::fs::read(self.dir.join(path)).await {
            Ok(bytes) => Ok((bytes, content_type)),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, path, "failed to read upload");
                }
                Err(UploadError::NotFound)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_types() {
        for ct in ALLOWED_UPLOAD_TYPES {
            assert!(validate_upload(Some(*ct), 10).is_ok());
        }
        assert!(matches!(
            validate_upload(Some("application/pdf"), 10),
            Err(UploadError::InvalidType)
        ));
        assert!(matches!(validate_upload(None, 10), Err(UploadError::InvalidType)));
    }

    #[test]
    fn test_validate_upload_size_limit() {
        assert!(validate_upload(Some("image/png"), MAX_UPLOAD_BYTES).is_ok());
        let err = validate_upload(Some("image/png"), MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(err.to_string(), "File too large (max 5MB)");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my photo (1).PNG"), "my_photo__1_.PNG");
        assert_eq!(sanitize_file_name("스크린샷.png"), "____.png");
        assert_eq!(sanitize_file_name("a-b.c"), "a-b.c");
    }

    #[test]
    fn test_stored_file_name() {
        assert_eq!(stored_file_name("cat.jpg", 1_700_000_000_000), "1700000000000-cat.jpg");
        assert_eq!(stored_file_name("", 1), "1-upload");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("dir/a.svg"), Some("image/svg+xml"));
        assert_eq!(content_type_for("a.txt"), None);
        assert_eq!(content_type_for("noext"), None);
    }

    #[test]
    fn test_check_relative_path() {
        assert!(check_relative_path("123-a.png").is_ok());
        assert!(check_relative_path("2025/a.png").is_ok());
        assert!(check_relative_path("../secret.png").is_err());
        assert!(check_relative_path("a/../../b.png").is_err());
        assert!(check_relative_path("/etc/passwd").is_err());
        assert!(check_relative_path("a\\b.png").is_err());
        assert!(check_relative_path("").is_err());
    }

    #[tokio::test]
    async fn test_save_and_read_roundtrip() {
        let dir = std::env::temp_dir().join(format!("techblog-uploads-{}", uuid::Uuid::new_v4()));
        let store = UploadStore::new(&dir);

        let name = store.save("cat pic.png", b"\x89PNG").await.unwrap();
        assert!(name.ends_with("-cat_pic.png"));

        let (bytes, content_type) = store.read(&name).await.unwrap();
        assert_eq!(bytes, b"\x89PNG");
        assert_eq!(content_type, "image/png");

        assert!(matches!(store.read("missing.png").await, Err(UploadError::NotFound)));
        assert!(matches!(store.read("notes.txt").await, Err(UploadError::InvalidType)));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

//! Serving uploaded images.

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::uploads::IMMUTABLE_CACHE;

/// `GET /uploads/{*path}`.
///
/// # Errors
///
/// 400 for traversal attempts or non-image extensions, 404 if the file is missing.
#[instrument(skip(state))]
pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (bytes, content_type) = state.uploads().read(&path).await?;
    Ok((
        [(CONTENT_TYPE, content_type), (CACHE_CONTROL, IMMUTABLE_CACHE)],
        bytes,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::routes::tests::{test_app, test_config};

    async fn status_and_body(dir: std::path::PathBuf, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = test_app(test_config(dir, None))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_serves_stored_file_with_immutable_cache() {
        let dir = std::env::temp_dir().join(format!("techblog-serve-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("1700000000000-cat.png"), b"png-bytes")
            .await
            .unwrap();

        let response = test_app(test_config(dir.clone(), None))
            .oneshot(
                Request::builder()
                    .uri("/uploads/1700000000000-cat.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(
            response.headers()["cache-control"],
            "public, max-age=31536000, immutable"
        );

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let uri = "/uploads/a/..%2F..%2Fetc%2Fpasswd.png";
        let (status, _) = status_and_body(std::env::temp_dir(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension() {
        let (status, body) = status_and_body(std::env::temp_dir(), "/uploads/notes.txt").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid file type");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = std::env::temp_dir().join(format!("techblog-missing-{}", Uuid::new_v4()));
        let (status, _) = status_and_body(dir, "/uploads/nothing-here.jpg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

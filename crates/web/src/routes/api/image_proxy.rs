//! Same-origin proxy for images stored on the upload host.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::uploads::IMMUTABLE_CACHE;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// Whether `target` may be fetched. With no upload host configured nothing is.
fn is_allowed(target: &str, allowed_base: Option<&str>) -> bool {
    let Some(base) = allowed_base.filter(|b| !b.is_empty()) else {
        return false;
    };
    let is_http = Url::parse(target).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
    is_http && target.starts_with(base)
}

/// `GET /api/image-proxy?url=`.
///
/// # Errors
///
/// 400 without `url`, 403 outside the upload host, 404 if upstream answers
/// with an error, 500 if the fetch fails.
#[instrument(skip(state))]
pub async fn proxy(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> ApiResult<impl IntoResponse> {
    let Some(target) = query.url.filter(|u| !u.is_empty()) else {
        return Err(ApiError::bad_request("Missing url parameter"));
    };

    let allowed_base = state.config().uploads.proxy_base_url.as_deref();
    if !is_allowed(&target, allowed_base) {
        tracing::warn!(url = %target, "image proxy target not allowed");
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Not allowed"));
    }

    let fetch_failed = |e: reqwest::Error| {
        tracing::error!(error = %e, url = %target, "image proxy fetch failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Fetch failed")
    };

    let response = state.http().get(&target).send().await.map_err(fetch_failed)?;
    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), url = %target, "image proxy upstream error");
        return Err(ApiError::not_found());
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_owned();
    let body: Bytes = response.bytes().await.map_err(fetch_failed)?;

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CACHE_CONTROL, IMMUTABLE_CACHE.to_owned()),
        ],
        body,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{test_app, test_config};

    const BASE: &str = "http://10.0.0.5:8080/uploads/";

    #[test]
    fn test_is_allowed() {
        assert!(is_allowed("http://10.0.0.5:8080/uploads/a.png", Some(BASE)));
        assert!(!is_allowed("http://evil.example/a.png", Some(BASE)));
        assert!(!is_allowed("http://10.0.0.5:8080/uploads/a.png", None));
        assert!(!is_allowed("http://10.0.0.5:8080/uploads/a.png", Some("")));
        assert!(!is_allowed("not a url", Some("not")));
    }

    async fn status_of(proxy_base: Option<&str>, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = test_app(test_config(std::env::temp_dir(), proxy_base));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_url() {
        let (status, body) = status_of(Some(BASE), "/api/image-proxy").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing url parameter");
    }

    #[tokio::test]
    async fn test_unconfigured_host_forbids_everything() {
        let (status, body) =
            status_of(None, "/api/image-proxy?url=http%3A%2F%2F10.0.0.5%3A8080%2Fuploads%2Fa.png").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Not allowed");
    }

    #[tokio::test]
    async fn test_foreign_host_is_forbidden() {
        let (status, _) =
            status_of(Some(BASE), "/api/image-proxy?url=https%3A%2F%2Fevil.example%2Fa.png").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_500() {
        let (status, body) = status_of(
            Some("http://127.0.0.1:1/"),
            "/api/image-proxy?url=http%3A%2F%2F127.0.0.1%3A1%2Fa.png",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Fetch failed");
    }
}

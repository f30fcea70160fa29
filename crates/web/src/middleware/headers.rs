//! Security and cache headers applied to every response.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, COOKIE, REFERRER_POLICY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::session::SESSION_COOKIE_NAME;

/// Public pages may be served from a shared cache for a minute.
const PUBLIC_CACHE: &str = "public, s-maxage=60, stale-while-revalidate=300";
const NO_STORE: &str = "no-store, max-age=0";

/// GitHub avatars appear in the header; post bodies may embed any https image.
const CSP: &str = "default-src 'none'; \
                   script-src 'self'; \
                   style-src 'self' 'unsafe-inline'; \
                   font-src 'self'; \
                   img-src 'self' https://avatars.githubusercontent.com https: data: blob:; \
                   connect-src 'self'; \
                   frame-src 'none'; \
                   object-src 'none'; \
                   base-uri 'self'; \
                   form-action 'self'; \
                   frame-ancestors 'none'";

/// Add security headers and a `Cache-Control` policy.
///
/// A `Cache-Control` set by the handler (uploads, image proxy) is kept.
pub async fn response_headers_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let cacheable_request =
        request.method() == Method::GET && !has_session_cookie(request.headers());

    let mut response = next.run(request).await;
    let status = response.status();
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), geolocation=(), microphone=(), payment=(), usb=()"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        let policy = cache_policy(&path, cacheable_request, status);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(policy));
    }

    response
}

/// Pick the `Cache-Control` value for a response without one.
///
/// Only anonymous, successful GETs of public pages are shareable; anything
/// under `/admin`, `/api` or `/auth` is never stored.
pub(crate) fn cache_policy(path: &str, cacheable_request: bool, status: StatusCode) -> &'static str {
    let private_area = ["/admin", "/api", "/auth"]
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")));

    if private_area || !cacheable_request || !status.is_success() || path.starts_with("/health") {
        NO_STORE
    } else {
        PUBLIC_CACHE
    }
}

fn has_session_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| {
            pair.trim()
                .split_once('=')
                .is_some_and(|(name, _)| name == SESSION_COOKIE_NAME)
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_pages_are_shared_cacheable() {
        assert_eq!(cache_policy("/", true, StatusCode::OK), PUBLIC_CACHE);
        assert_eq!(cache_policy("/posts/hello", true, StatusCode::OK), PUBLIC_CACHE);
        assert_eq!(cache_policy("/feed.xml", true, StatusCode::OK), PUBLIC_CACHE);
    }

    #[test]
    fn test_private_areas_are_not_stored() {
        assert_eq!(cache_policy("/admin", true, StatusCode::OK), NO_STORE);
        assert_eq!(cache_policy("/admin/posts", true, StatusCode::OK), NO_STORE);
        assert_eq!(cache_policy("/api/posts", true, StatusCode::OK), NO_STORE);
        assert_eq!(cache_policy("/auth/github/login", true, StatusCode::OK), NO_STORE);
        // Only whole path segments count.
        assert_eq!(cache_policy("/administrivia", true, StatusCode::OK), PUBLIC_CACHE);
    }

    #[test]
    fn test_signed_in_and_errors_are_not_stored() {
        assert_eq!(cache_policy("/", false, StatusCode::OK), NO_STORE);
        assert_eq!(cache_policy("/posts/x", true, StatusCode::NOT_FOUND), NO_STORE);
    }

    #[test]
    fn test_has_session_cookie() {
        let mut headers = HeaderMap::new();
        assert!(!has_session_cookie(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; techblog_session=abc"));
        assert!(has_session_cookie(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("techblog_session_old=abc"));
        assert!(!has_session_cookie(&headers));
    }
}

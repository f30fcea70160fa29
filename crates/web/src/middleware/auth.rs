//! Authentication extractors.
//!
//! The session only says who signed in. [`RequireAdmin`] runs the admin check
//! from [`crate::services::admin`] on every request it guards.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::AccountRepository;
use crate::error::ApiError;
use crate::filters;
use crate::models::{CurrentUser, session::keys};
use crate::state::AppState;

/// Where unauthenticated admin requests are sent.
pub const LOGIN_PATH: &str = "/auth/github/login";

/// Shown to a signed-in user who is not the admin.
#[derive(Template, WebTemplate)]
#[template(path = "forbidden.html")]
pub struct ForbiddenTemplate {
    pub user: Option<CurrentUser>,
}

/// Extractor that optionally gets the signed-in user.
///
/// Never rejects; a missing or unreadable session is `None`.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Extractor that only lets the admin through.
///
/// HTML routes redirect anonymous visitors to GitHub sign-in and show a 403
/// page to everyone else. `/api` routes answer `401 {"error":"Unauthorized"}`
/// in both cases.
pub struct RequireAdmin(pub CurrentUser);

/// Why [`RequireAdmin`] refused a request.
pub enum AdminRejection {
    /// Not signed in, HTML request.
    RedirectToLogin,
    /// Signed in but not the admin, HTML request.
    Forbidden(CurrentUser),
    /// Any refusal on a JSON route.
    Unauthorized,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Forbidden(user) => (
                StatusCode::FORBIDDEN,
                ForbiddenTemplate { user: Some(user) },
            )
                .into_response(),
            Self::Unauthorized => ApiError::unauthorized().into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");
        let user = session_user(parts).await;

        let is_admin = viewer_is_admin(state, user.as_ref()).await;

        match (is_admin, user) {
            (true, Some(user)) => Ok(Self(user)),
            _ if is_api => Err(AdminRejection::Unauthorized),
            (_, Some(user)) => Err(AdminRejection::Forbidden(user)),
            (_, None) => {
                remember_return_to(parts).await;
                Err(AdminRejection::RedirectToLogin)
            }
        }
    }
}

/// Run the admin check for an optional session user.
pub async fn viewer_is_admin(state: &AppState, user: Option<&CurrentUser>) -> bool {
    let accounts = AccountRepository::new(state.pool());
    state.admin_gate().is_admin(user, &accounts).await
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read session");
            None
        }
    }
}

/// Keep the requested admin page so sign-in can return to it.
async fn remember_return_to(parts: &Parts) {
    let Some(session) = parts.extensions.get::<Session>() else {
        return;
    };
    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
    if let Err(e) = session.insert(keys::RETURN_TO, target).await {
        tracing::warn!(error = %e, "failed to store return path");
    }
}

/// Store the signed-in user and rotate the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Drop everything in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::get,
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use techblog_core::UserId;

    use super::*;
    use crate::routes::tests::test_config;

    /// Signed in, but without an email, so the admin check refuses
    /// before touching the database.
    fn visitor() -> CurrentUser {
        CurrentUser {
            id: UserId::new(9),
            email: None,
            name: Some("visitor".to_owned()),
            avatar_url: None,
        }
    }

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://techblog@127.0.0.1:1/techblog_test")
            .unwrap();
        let state = AppState::new(test_config(std::env::temp_dir(), None), pool);

        Router::new()
            .route(
                "/sign-in",
                get(|session: Session| async move {
                    set_current_user(&session, &visitor()).await.unwrap();
                }),
            )
            .route("/admin", get(|RequireAdmin(_): RequireAdmin| async { "ok" }))
            .route("/api/admin", get(|RequireAdmin(_): RequireAdmin| async { "ok" }))
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
            .with_state(state)
    }

    async fn signed_in_cookie(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/sign-in").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_owned()
    }

    async fn get_with_cookie(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_non_admin_gets_forbidden_page() {
        let app = app();
        let cookie = signed_in_cookie(&app).await;

        let response = get_with_cookie(&app, "/admin", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("접근 권한이 없습니다"));
        assert!(html.contains(r#"action="/auth/logout""#));
        assert!(html.contains("visitor"));
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        let response = get_with_cookie(&app(), "/admin", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_api_refusal_is_401_even_when_signed_in() {
        let app = app();
        let cookie = signed_in_cookie(&app).await;

        let response = get_with_cookie(&app, "/api/admin", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

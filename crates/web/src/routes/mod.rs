//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home (latest posts, categories)
//! GET  /posts                    - Post list (?q, ?category, ?tags, ?page)
//! GET  /posts/{slug}             - Post detail
//! GET  /categories/{slug}        - Posts in a category (?page)
//! GET  /feed.xml                 - RSS 2.0 feed
//! GET  /uploads/{*path}          - Uploaded images
//! GET  /health, /health/ready    - Liveness and readiness
//!
//! # Auth
//! GET  /auth/github/login        - Redirect to GitHub OAuth
//! GET  /auth/github/callback     - Handle OAuth callback
//! POST /auth/logout              - Sign out
//!
//! # Admin (RequireAdmin)
//! GET  /admin                    - Dashboard
//! GET  /admin/posts              - Post table (?q, ?category, ?status, ?sort, ?dir)
//! GET  /admin/posts/new          - New post form
//! POST /admin/posts              - Create post
//! GET  /admin/posts/{id}/edit    - Edit form
//! POST /admin/posts/{id}         - Update post
//! POST /admin/posts/{id}/delete  - Delete post
//! GET  /admin/categories         - Category table
//! POST /admin/categories         - Add category
//! POST /admin/categories/{id}/delete - Delete an empty category
//!
//! # JSON API
//! GET    /api/posts              - List (?all, ?q, ?category, ?tags, ?page, ?limit)
//! POST   /api/posts              - Create (admin)
//! GET    /api/posts/{id}         - One post
//! PUT    /api/posts/{id}         - Partial update (admin)
//! DELETE /api/posts/{id}         - Delete (admin)
//! GET    /api/categories         - List with post counts
//! POST   /api/categories         - Create (admin)
//! DELETE /api/categories         - Delete by `{id}` (admin)
//! POST   /api/upload             - Multipart image upload (admin)
//! POST   /api/preview            - Render markdown (admin)
//! GET    /api/image-proxy        - Fetch an image from the upload origin
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod categories;
pub mod feed;
pub mod home;
pub mod posts;
pub mod uploads;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info_span;

use crate::middleware::{
    create_session_layer, request_id_middleware, response_headers_middleware,
};
use crate::state::AppState;
/// Directory served under `/static`, relative to the working directory.
pub const STATIC_DIR: &str = "crates/web/static";

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/github/login", get(auth::login))
        .route("/github/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard::index))
        .route("/posts", get(admin::posts::index).post(admin::posts::create))
        .route("/posts/new", get(admin::posts::new))
        .route("/posts/{id}", post(admin::posts::update))
        .route("/posts/{id}/edit", get(admin::posts::edit))
        .route("/posts/{id}/delete", post(admin::posts::delete))
        .route(
            "/categories",
            get(admin::categories::index).post(admin::categories::create),
        )
        .route("/categories/{id}/delete", post(admin::categories::delete))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(api::posts::index).post(api::posts::create))
        .route(
            "/posts/{id}",
            get(api::posts::show)
                .put(api::posts::update)
                .delete(api::posts::delete),
        )
        .route(
            "/categories",
            get(api::categories::index)
                .post(api::categories::create)
                .delete(api::categories::delete),
        )
        .route(
            "/upload",
            post(api::upload::upload)
                .layer(DefaultBodyLimit::max(api::upload::UPLOAD_BODY_LIMIT)),
        )
        .route("/preview", post(api::preview::preview))
        .route("/image-proxy", get(api::image_proxy::proxy))
}

/// Every route, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/posts", get(posts::index))
        .route("/posts/{slug}", get(posts::show))
        .route("/categories/{slug}", get(categories::show))
        .route("/feed.xml", get(feed::feed))
        .route("/uploads/{*path}", get(uploads::serve))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/api", api_routes())
}

/// The full application: routes, static files and the middleware stack.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(middleware::from_fn(response_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

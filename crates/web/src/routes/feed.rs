//! RSS feed route handler.

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use tracing::instrument;

use techblog_core::pagination::PageRequest;

use crate::db::PostRepository;
use crate::error::Result;
use crate::feed::{FEED_SIZE, RSS_CONTENT_TYPE, render_feed};
use crate::models::PostFilter;
use crate::state::AppState;

/// `GET /feed.xml`: the newest published posts as RSS 2.0.
///
/// # Errors
///
/// Returns an error if the posts cannot be loaded.
#[instrument(skip(state))]
pub async fn feed(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let posts = PostRepository::new(state.pool())
        .list(&PostFilter::published(), PageRequest::new(1, FEED_SIZE))
        .await?;

    let xml = render_feed(&state.config().base_url, &posts);
    Ok(([(CONTENT_TYPE, RSS_CONTENT_TYPE)], xml))
}

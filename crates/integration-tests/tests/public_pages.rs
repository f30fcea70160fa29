//! Public pages against a running server.
//!
//! Requires a migrated database and the web server (cargo run -p techblog-web).

use reqwest::StatusCode;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use techblog_integration_tests::{base_url, client};

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_health() {
    let base_url = base_url();
    let resp = client()
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client()
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_home_page() {
    let resp = client()
        .get(base_url())
        .send()
        .await
        .expect("Failed to get home page");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[CACHE_CONTROL]
            .to_str()
            .expect("ascii header")
            .contains("s-maxage=60")
    );
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("<html"));
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_post_list_filters() {
    let base_url = base_url();

    for query in ["", "?page=2", "?q=rust", "?tags=rust,axum", "?page=abc"] {
        let resp = client()
            .get(format!("{base_url}/posts{query}"))
            .send()
            .await
            .expect("Failed to get post list");
        assert_eq!(resp.status(), StatusCode::OK, "/posts{query}");
    }
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_unknown_post_is_404() {
    let resp = client()
        .get(format!("{}/posts/no-such-post-slug-here", base_url()))
        .send()
        .await
        .expect("Failed to get post");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_feed_is_rss() {
    let resp = client()
        .get(format!("{}/feed.xml", base_url()))
        .send()
        .await
        .expect("Failed to get feed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[CONTENT_TYPE]
            .to_str()
            .expect("ascii header")
            .starts_with("application/rss+xml")
    );
    let body = resp.text().await.expect("Failed to read body");
    assert!(body.contains("<rss version=\"2.0\""));
}

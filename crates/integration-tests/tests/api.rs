//! JSON API against a running server, as an anonymous caller.
//!
//! Requires a migrated database and the web server (cargo run -p techblog-web).

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use techblog_core::pagination::POSTS_PER_PAGE;
use techblog_integration_tests::{base_url, client};

async fn get_json(path: &str) -> (StatusCode, Value) {
    let resp = client()
        .get(format!("{}{path}", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    let status = resp.status();
    let body = resp.json().await.expect("Response is not JSON");
    (status, body)
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_list_posts_unpaged() {
    let (status, body) = get_json("/api/posts").await;
    assert_eq!(status, StatusCode::OK);

    let posts = body.as_array().expect("unpaged list is an array");
    for post in posts {
        assert_eq!(post["published"], true);
    }
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_list_posts_paged() {
    let (status, body) = get_json(&format!("/api/posts?limit={POSTS_PER_PAGE}&page=1")).await;
    assert_eq!(status, StatusCode::OK);

    let posts = body["posts"].as_array().expect("paged list has posts");
    assert!(posts.len() <= POSTS_PER_PAGE as usize);
    assert!(body["totalCount"].as_u64().is_some());
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_list_all_posts_requires_admin() {
    let (status, body) = get_json("/api/posts?all=true").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_list_categories() {
    let (status, body) = get_json("/api/categories").await;
    assert_eq!(status, StatusCode::OK);

    for category in body.as_array().expect("categories are an array") {
        assert!(category["slug"].is_string());
        assert!(category["postCount"].is_i64());
    }
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_unknown_post_id() {
    let (status, body) = get_json("/api/posts/not-a-number").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_writes_require_admin() {
    let base_url = base_url();
    let requests = [
        (Method::POST, "/api/posts", json!({"title": "t", "content": "c"})),
        (Method::PUT, "/api/posts/1", json!({"title": "t"})),
        (Method::DELETE, "/api/posts/1", json!({})),
        (Method::POST, "/api/categories", json!({"name": "Rust"})),
        (Method::DELETE, "/api/categories", json!({"id": 1})),
        (Method::POST, "/api/preview", json!({"content": "# hi"})),
    ];

    for (method, path, body) in requests {
        let resp = client()
            .request(method.clone(), format!("{base_url}{path}"))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running blog server"]
async fn test_image_proxy_rejects_foreign_hosts() {
    let (status, body) =
        get_json("/api/image-proxy?url=https%3A%2F%2Fevil.example%2Fa.png").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not allowed");

    let (status, _) = get_json("/api/image-proxy").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//! Integration tests for the tech blog.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server
//! cargo run -p techblog-cli -- migrate
//! cargo run -p techblog-web
//!
//! # Run the ignored tests against it
//! BLOG_TEST_URL=http://localhost:3000 cargo test -p techblog-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `public_pages` - Home, post list, feed, health
//! - `api` - JSON API reads and the admin-only writes
//! - `admin_access` - Anonymous access to the admin panel

use reqwest::Client;
use reqwest::redirect::Policy;

/// Server under test; `BLOG_TEST_URL` or `http://localhost:3000`.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BLOG_TEST_URL")
        .map(|url| url.trim_end_matches('/').to_owned())
        .unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// Cookie-keeping client that does not follow redirects.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialised.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

//! Blog configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLOG_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//! - `AUTH_GITHUB_ID` (or `GITHUB_ID`) - GitHub OAuth app client ID
//! - `AUTH_GITHUB_SECRET` (or `GITHUB_SECRET`) - GitHub OAuth app client secret
//!
//! ## Optional
//! - `BLOG_HOST` - Bind address (default: 127.0.0.1)
//! - `BLOG_PORT` - Listen port (default: 3000)
//! - `BASE_URL` (or `NEXTAUTH_URL`) - Public URL (default: <http://localhost:3000>)
//! - `ADMIN_GITHUB_USERNAME` - GitHub login allowed into the admin panel.
//!   Without it nobody is admin.
//! - `GITHUB_API_URL` - GitHub REST API root (default: <https://api.github.com>)
//! - `UPLOAD_DIR` - Where uploaded images are written (default: public/uploads)
//! - `UPLOAD_BASE_URL` - Origin the image proxy may fetch from. Without it the
//!   proxy refuses everything.
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_UPLOAD_DIR: &str = "public/uploads";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Blog application configuration.
#[derive(Debug, Clone)]
pub struct BlogConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without trailing slash
    pub base_url: String,
    /// Session secret
    pub session_secret: SecretString,
    /// GitHub OAuth and API settings
    pub github: GithubConfig,
    /// Image upload settings
    pub uploads: UploadConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// GitHub OAuth application and API configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// REST API root, e.g. `https://api.github.com`
    pub api_url: String,
    /// The single GitHub login treated as administrator.
    pub admin_username: Option<String>,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("admin_username", &self.admin_username)
            .finish()
    }
}

/// Where uploads live and which remote origin the image proxy trusts.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub proxy_base_url: Option<String>,
}

impl BlogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BLOG_DATABASE_URL")?;
        let host = get_env_or_default("BLOG_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BLOG_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BLOG_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BLOG_PORT".to_string(), e.to_string()))?;
        let base_url = normalize_base_url(
            &get_first_env(&["BASE_URL", "NEXTAUTH_URL"])
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        );
        let session_secret = get_validated_secret("SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SESSION_SECRET")?;

        let github = GithubConfig::from_env()?;
        let uploads = UploadConfig::from_env();

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            github,
            uploads,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl GithubConfig {
    /// OAuth credentials, API root and admin login from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the client ID or secret is missing or weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = get_first_env(&["AUTH_GITHUB_ID", "GITHUB_ID"])
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_GITHUB_ID".to_string()))?;
        let (secret_key, secret) = get_first_env_with_key(&["AUTH_GITHUB_SECRET", "GITHUB_SECRET"])
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_GITHUB_SECRET".to_string()))?;
        validate_secret_strength(&secret, secret_key)?;

        Ok(Self {
            client_id,
            client_secret: SecretString::from(secret),
            api_url: get_env_or_default("GITHUB_API_URL", DEFAULT_GITHUB_API_URL)
                .trim_end_matches('/')
                .to_string(),
            admin_username: get_optional_env("ADMIN_GITHUB_USERNAME")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

impl UploadConfig {
    fn from_env() -> Self {
        Self {
            dir: PathBuf::from(get_env_or_default("UPLOAD_DIR", DEFAULT_UPLOAD_DIR)),
            proxy_base_url: get_optional_env("UPLOAD_BASE_URL").filter(|s| !s.is_empty()),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// First non-empty value among `keys`, together with the key that supplied it.
fn get_first_env_with_key<'k>(keys: &[&'k str]) -> Option<(&'k str, String)> {
    keys.iter().find_map(|&key| {
        get_optional_env(key)
            .filter(|v| !v.is_empty())
            .map(|v| (key, v))
    })
}

/// First non-empty value among `keys`.
fn get_first_env(keys: &[&str]) -> Option<String> {
    get_first_env_with_key(keys).map(|(_, value)| value)
}

/// Strip trailing slashes so `format!("{base}/path")` never doubles them.
fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> BlogConfig {
        BlogConfig {
            database_url: SecretString::from("postgres://localhost/techblog"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            github: GithubConfig {
                client_id: "Iv1.client_id_value".to_string(),
                client_secret: SecretString::from("super_private_client_value"),
                api_url: DEFAULT_GITHUB_API_URL.to_string(),
                admin_username: Some("octocat".to_string()),
            },
            uploads: UploadConfig {
                dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
                proxy_base_url: None,
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_counts_chars_not_bytes() {
        // Two distinct Hangul syllables: 1 bit per char regardless of UTF-8 width
        let entropy = shannon_entropy("가나");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-github-secret", "AUTH_GITHUB_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(ref var, _) if var == "AUTH_GITHUB_SECRET"));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(40), "SESSION_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_github_style_secret() {
        // GitHub client secrets are 40 hex characters
        let result =
            validate_secret_strength("3f9a1c7be04d2f68a5c1e9b7d03a6f24c8e1b5d9", "AUTH_GITHUB_SECRET");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "SESSION_SECRET").is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "SESSION_SECRET").is_ok());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url(" https://blog.example.dev/ "),
            "https://blog.example.dev"
        );
        assert_eq!(normalize_base_url("http://localhost:3000"), "http://localhost:3000");
    }

    #[test]
    fn test_socket_addr_and_https() {
        let mut config = sample_config();
        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
        assert!(!config.is_https());

        config.base_url = "https://blog.example.dev".to_string();
        assert!(config.is_https());
    }

    #[test]
    fn test_github_config_debug_redacts_secret() {
        let config = sample_config();
        let debug_output = format!("{:?}", config.github);

        assert!(debug_output.contains("Iv1.client_id_value"));
        assert!(debug_output.contains("octocat"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_client_value"));
    }
}

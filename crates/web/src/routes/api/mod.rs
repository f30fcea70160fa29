//! JSON API handlers.
//!
//! Every error is `{"error": "..."}`. Admin-only handlers take
//! [`RequireAdmin`](crate::middleware::RequireAdmin), which answers `401`
//! under `/api`.

pub mod categories;
pub mod image_proxy;
pub mod posts;
pub mod preview;
pub mod upload;

use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use techblog_core::CategoryId;

use crate::error::ApiError;

/// Deserialize a field so that a present `null` is `Some(None)` and an
/// absent field (with `#[serde(default)]`) is `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Read a category id sent as a number, a numeric string, `""`, `0` or `null`.
///
/// # Errors
///
/// Returns a 400 for anything else.
pub(crate) fn category_id_from_json(value: &Value) -> Result<Option<CategoryId>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid categoryId");
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(None),
            Some(id) => i32::try_from(id).map(|id| Some(CategoryId::new(id))).map_err(|_| invalid()),
            None => Err(invalid()),
        },
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.parse::<CategoryId>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Turn an axum JSON rejection into our error body.
pub(crate) fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|axum::Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected JSON body");
        ApiError::bad_request("Invalid JSON body")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        excerpt: Option<Option<String>>,
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.excerpt, None);

        let null: Patch = serde_json::from_value(json!({ "excerpt": null })).unwrap();
        assert_eq!(null.excerpt, Some(None));

        let set: Patch = serde_json::from_value(json!({ "excerpt": "hi" })).unwrap();
        assert_eq!(set.excerpt, Some(Some("hi".to_owned())));
    }

    #[test]
    fn test_category_id_from_json() {
        assert_eq!(category_id_from_json(&json!(null)).unwrap(), None);
        assert_eq!(category_id_from_json(&json!(0)).unwrap(), None);
        assert_eq!(category_id_from_json(&json!("")).unwrap(), None);
        assert_eq!(category_id_from_json(&json!(3)).unwrap(), Some(CategoryId::new(3)));
        assert_eq!(category_id_from_json(&json!("12")).unwrap(), Some(CategoryId::new(12)));
        assert!(category_id_from_json(&json!("abc")).is_err());
        assert!(category_id_from_json(&json!(true)).is_err());
        assert!(category_id_from_json(&json!(1.5)).is_err());
    }
}

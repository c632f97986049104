//! The response envelope every Bot API call is wrapped in.
//!
//! The remote side answers each request with the same shape regardless of
//! method: `{"ok": true, "result": …}` on success, or `{"ok": false,
//! "error_code": …, "description": …}` on failure.  Webhook pushes reuse
//! the same wrapper around a batch of updates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Uniform success/failure wrapper around a Bot API result.
///
/// Deserialized leniently: `result` is absent on failure, the error
/// fields are absent on success.  Use [`ApiResponse::into_result`] to
/// collapse the envelope into a `Result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ResponseParameters>,
}

impl<T> ApiResponse<T> {
    /// Wrap a successful result.
    pub fn ok(result: T) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error_code: None,
            description: None,
            parameters: None,
        }
    }

    /// Collapse the envelope into a `Result`, turning an `ok: false`
    /// answer (or a malformed `ok: true` answer with no result) into an
    /// [`ApiError`].
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(ApiError {
                error_code: 0,
                description: "ok response carried no result".to_owned(),
                parameters: None,
            }),
            (false, _) => Err(ApiError {
                error_code: self.error_code.unwrap_or(0),
                description: self
                    .description
                    .unwrap_or_else(|| "unknown error".to_owned()),
                parameters: self.parameters,
            }),
        }
    }
}

/// An `ok: false` answer from the remote API.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error_code}: {description}")]
pub struct ApiError {
    pub error_code: i64,
    pub description: String,
    pub parameters: Option<ResponseParameters>,
}

/// Extra failure context the remote API attaches to some errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseParameters {
    /// The group was migrated to a supergroup with this chat id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    /// Flood control: retry after this many seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
}

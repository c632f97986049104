//! HTTP client for the Bot API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod api;
mod files;

pub use api::BotApi;
pub use files::InputFile;

use reqwest::StatusCode;

/// Errors produced by the HTTP client.
///
/// An `ok: false` answer from the remote API is NOT a `ClientError`: it
/// arrives inside the [`ApiResponse`](crate::ApiResponse) envelope so the
/// caller can inspect the error code and retry parameters.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status with a body that is not a
    /// response envelope.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the method path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

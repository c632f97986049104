//! Wire types and typed HTTP client for the Telegram Bot API.
//!
//! The `types` module mirrors the remote API schema (updates and their
//! payload objects), `envelope` holds the uniform success/failure wrapper
//! every call returns, and `params` the request bodies of the supported
//! methods.  The HTTP client itself lives behind the `client` cargo
//! feature so downstream crates that only need the shared types do not
//! pull in `reqwest`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod entities;
pub mod envelope;
pub mod params;
pub mod types;

#[cfg(feature = "client")]
pub mod client;

pub use envelope::{ApiError, ApiResponse, ResponseParameters};
pub use types::{Update, UpdateKind};

#[cfg(feature = "client")]
pub use client::{BotApi, ClientError, InputFile};

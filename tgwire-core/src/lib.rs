#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

//! Update delivery for the Telegram Bot API.
//!
//! The pipeline: a delivery source (the poller here, or the webhook
//! listener crate) produces raw [`Update`](tgwire_api::Update) records;
//! the classifier turns each into a [`TaggedUpdate`]; the
//! [`UpdateRouter`] fans classified updates out to a combined stream and
//! one per-kind stream.  The poller additionally tracks its position
//! with an [`UpdateCursor`].

pub mod bot;
pub mod config;
pub mod cursor;
pub mod events;
pub mod poller;

pub use bot::Bot;
pub use config::PollerConfig;
pub use cursor::UpdateCursor;
pub use events::classify::{classify, is_well_formed};
pub use events::router::{Subscription, UpdateRouter, UpdateStream};
pub use events::types::{TaggedUpdate, UpdatePayload};
pub use poller::{PollError, PollerState, UpdatePoller, UpdateSource};

//! Embeddable webhook listener for pushed Bot API updates.
//!
//! The remote platform POSTs an update envelope to a single configured
//! path; everything else is declined with the matching status code.
//! Accepted updates go through the same classification and fan-out as
//! polled ones — hand [`webhook_router`] the bot's shared
//! [`UpdateRouter`](tgwire_core::UpdateRouter) and subscribers cannot
//! tell the two delivery mechanisms apart.  Unlike polling there is no
//! cursor: the remote side stops re-pushing an update once the listener
//! answers 200.

pub mod config;
pub mod server;

pub use config::WebhookConfig;
pub use server::{WebhookRejection, WebhookState, serve, shutdown_signal, webhook_router};

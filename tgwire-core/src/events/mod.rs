//! Classification and fan-out of inbound updates.
//!
//! # Flow
//!
//! 1. A raw `Update` arrives from a delivery source (poller or webhook).
//! 2. [`classify`](classify::classify) tags it with its populated kind
//!    slot, or drops it as structurally invalid.
//! 3. The [`UpdateRouter`](router::UpdateRouter) delivers the tagged
//!    update to every combined-stream subscriber and to the subscribers
//!    of its kind.

pub mod classify;
pub mod router;
pub mod types;

pub use classify::{classify, is_well_formed};
pub use router::{Subscription, UpdateRouter, UpdateStream, BROADCAST_CHANNEL_CAPACITY};
pub use types::{TaggedUpdate, UpdatePayload};

//! Polling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tgwire_api::UpdateKind;

/// The remote API accepts batch sizes of 1–100.
pub const MAX_FETCH_LIMIT: u32 = 100;

/// Floor for the interval between fetch cycles.  Anything lower would
/// tight-loop against the remote endpoint when the queue is empty.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration of an [`UpdatePoller`](crate::poller::UpdatePoller).
///
/// Deserializable so hosts can embed it in their own config files; every
/// field has a default.  Out-of-range values are clamped by
/// [`normalized`](PollerConfig::normalized) when the poller is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Maximum updates per fetched batch, 1–100.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Long-poll timeout in seconds; 0 means short polling.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Restrict delivery to these kinds; `None` requests all kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateKind>>,

    /// Seconds between fetch cycles, floored at 1.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_limit() -> u32 {
    100
}

fn default_poll_interval_secs() -> u64 {
    1
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            timeout_secs: 0,
            allowed_updates: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl PollerConfig {
    /// Clamp out-of-range values into the accepted ranges.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_FETCH_LIMIT);
        self.poll_interval_secs = self
            .poll_interval_secs
            .max(MIN_POLL_INTERVAL.as_secs());
        self
    }

    /// The interval between fetch cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

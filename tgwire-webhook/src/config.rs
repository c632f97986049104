//! Webhook listener configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Configuration of the webhook listener.
///
/// Deserializable so hosts can embed it in their own config files;
/// every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// The single path updates are accepted on.  A secret path (e.g.
    /// containing the bot token) is the usual way to keep strangers
    /// from pushing fake updates.
    #[serde(default = "default_path")]
    pub path: String,

    /// The address and port to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_path() -> String {
    "/".to_owned()
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8443".parse().expect("valid default address")
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            listen: default_listen_addr(),
        }
    }
}

impl WebhookConfig {
    /// The configured path with a leading slash enforced.
    pub fn normalized_path(&self) -> String {
        if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        }
    }
}

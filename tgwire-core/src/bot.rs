//! The `Bot` facade: one token, one router, any number of delivery
//! mechanisms.

use std::sync::Arc;

use tgwire_api::BotApi;

use crate::config::PollerConfig;
use crate::events::router::UpdateRouter;
use crate::poller::UpdatePoller;

/// A bot: the typed API client plus the shared update router.
///
/// Cheap to clone.  All delivery mechanisms built from the same `Bot`
/// (a poller via [`polling`](Bot::polling), or a webhook listener
/// handed [`router`](Bot::router)) fan into the same subscriptions.
#[derive(Clone)]
pub struct Bot {
    api: BotApi,
    router: Arc<UpdateRouter>,
}

impl Bot {
    /// Create a bot for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api(BotApi::new(token))
    }

    /// Create a bot around an already-configured client (custom base
    /// URL, custom `reqwest::Client`, …).
    pub fn with_api(api: BotApi) -> Self {
        Self {
            api,
            router: Arc::new(UpdateRouter::new()),
        }
    }

    /// The typed API client.
    pub fn api(&self) -> &BotApi {
        &self.api
    }

    /// The shared update router; subscribe here.
    pub fn router(&self) -> &Arc<UpdateRouter> {
        &self.router
    }

    /// Build a polling engine wired to this bot's router.
    ///
    /// The poller owns its own cursor; run it with
    /// [`UpdatePoller::run`] or step it with
    /// [`UpdatePoller::run_cycle`].
    pub fn polling(&self, config: PollerConfig) -> UpdatePoller<BotApi> {
        UpdatePoller::new(self.api.clone(), Arc::clone(&self.router), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_shares_the_bot_router() {
        let bot = Bot::new("123:abc");
        let poller = bot.polling(PollerConfig::default());
        assert!(Arc::ptr_eq(bot.router(), poller.router()));
    }

    #[test]
    fn test_clones_share_the_router() {
        let bot = Bot::new("123:abc");
        let clone = bot.clone();
        assert!(Arc::ptr_eq(bot.router(), clone.router()));
    }
}

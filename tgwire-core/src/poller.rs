//! The polling engine.
//!
//! Drives repeated fetch → classify → route → advance cycles against an
//! [`UpdateSource`], tracking its position with an
//! [`UpdateCursor`](crate::cursor::UpdateCursor).  Fetch failures — both
//! transport errors and `ok: false` envelopes — are fanned out through
//! the router's error callbacks and never stop the schedule; the next
//! cycle runs at its normal time.  There is deliberately no backoff.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use tgwire_api::envelope::ApiResponse;
use tgwire_api::params::GetUpdates;
use tgwire_api::{BotApi, Update};

use crate::config::PollerConfig;
use crate::cursor::UpdateCursor;
use crate::events::classify::classify;
use crate::events::router::UpdateRouter;
use std::sync::Arc;

/// Error type delivery sources may fail with.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// The batch-fetch collaborator the poller pulls from.
///
/// One call per cycle.  Implementations perform a single request with
/// no retries or internal state; [`BotApi`] implements this via
/// `getUpdates`.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch a batch of updates starting at `params.offset`.
    async fn fetch_updates(
        &self,
        params: GetUpdates,
    ) -> Result<ApiResponse<Vec<Update>>, SourceError>;
}

#[async_trait]
impl UpdateSource for BotApi {
    async fn fetch_updates(
        &self,
        params: GetUpdates,
    ) -> Result<ApiResponse<Vec<Update>>, SourceError> {
        Ok(self.get_updates(&params).await?)
    }
}

/// A failure surfaced through the router's error callbacks.
#[derive(Debug, Error)]
pub enum PollError {
    /// The remote API answered `ok: false`.
    #[error("api error {error_code}: {description}")]
    Api { error_code: i64, description: String },

    /// The fetch itself failed (network, TLS, decode, …).
    #[error("transport error: {0}")]
    Transport(#[source] SourceError),
}

/// Lifecycle position of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Between cycles; the next timer tick starts a fetch.
    Idle,
    /// A fetch is in flight.
    AwaitingResponse,
    /// A fetched batch is being classified and routed.
    Delivering,
    /// Stopped; no further fetches are scheduled.
    Stopped,
}

/// The polling engine.
///
/// Owns its cursor exclusively; stopping preserves the cursor, so a
/// stopped poller can be [`run`](UpdatePoller::run) again (with a fresh
/// shutdown channel) and resumes where it left off.
pub struct UpdatePoller<S: UpdateSource> {
    source: S,
    router: Arc<UpdateRouter>,
    config: PollerConfig,
    cursor: UpdateCursor,
    state: PollerState,
}

impl<S: UpdateSource> UpdatePoller<S> {
    /// Build a poller over `source`, delivering through `router`.
    ///
    /// Out-of-range config values are clamped (batch limit into 1–100,
    /// poll interval floored at one second).
    pub fn new(source: S, router: Arc<UpdateRouter>, config: PollerConfig) -> Self {
        Self {
            source,
            router,
            config: config.normalized(),
            cursor: UpdateCursor::new(),
            state: PollerState::Idle,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// The offset the next fetch will request.
    pub fn offset(&self) -> i64 {
        self.cursor.current()
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<UpdateRouter> {
        &self.router
    }

    /// Run fetch cycles until `shutdown_rx` flips to `true`.
    ///
    /// The first cycle starts immediately; subsequent cycles run after
    /// the configured interval.  Shutdown wins the race against an
    /// in-flight cycle: the fetch future is dropped and a response that
    /// arrives after the stop is discarded, not routed.
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(offset = self.cursor.current(), "Update poller started");
        self.state = PollerState::Idle;

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Update poller received shutdown signal");
                        break;
                    }
                }

                _ = self.run_cycle() => {}
            }

            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Update poller received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        self.state = PollerState::Stopped;
        info!(offset = self.cursor.current(), "Update poller stopped");
    }

    /// Perform one fetch → classify → route → advance cycle.
    ///
    /// Public so hosts (and tests) can step the engine without the
    /// timer loop.
    pub async fn run_cycle(&mut self) {
        self.state = PollerState::AwaitingResponse;
        let params = GetUpdates {
            offset: Some(self.cursor.current()),
            limit: Some(self.config.limit),
            timeout: Some(self.config.timeout_secs),
            allowed_updates: self.config.allowed_updates.clone(),
        };
        debug!(offset = self.cursor.current(), "Fetching updates");

        match self.source.fetch_updates(params).await {
            Err(e) => {
                warn!(error = %e, "Update fetch failed");
                self.router.emit_error(&PollError::Transport(e));
            }
            Ok(envelope) if !envelope.ok => {
                let error = PollError::Api {
                    error_code: envelope.error_code.unwrap_or(0),
                    description: envelope
                        .description
                        .unwrap_or_else(|| "unknown error".to_owned()),
                };
                warn!(error = %error, "Update fetch rejected by remote API");
                self.router.emit_error(&error);
            }
            Ok(envelope) => {
                let batch = envelope.result.unwrap_or_default();
                if !batch.is_empty() {
                    self.deliver(&batch);
                }
            }
        }

        self.state = PollerState::Idle;
    }

    fn deliver(&mut self, batch: &[Update]) {
        self.state = PollerState::Delivering;
        debug!(count = batch.len(), "Delivering update batch");

        for update in batch {
            match classify(update) {
                Some(tagged) => self.router.emit(tagged),
                None => debug!(
                    update_id = update.update_id,
                    "Dropping update with no recognizable payload"
                ),
            }
        }

        // Advance over the raw batch, not just the classified subset:
        // an unrecognized update must not be re-fetched forever.
        self.cursor.advance(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::UpdatePayload;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tgwire_api::types::{Chat, Message};

    /// Replays a script of responses and records the requested offsets.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<ApiResponse<Vec<Update>>, String>>>,
        offsets: Arc<Mutex<Vec<i64>>>,
    }

    impl ScriptedSource {
        fn new(
            script: Vec<Result<ApiResponse<Vec<Update>>, String>>,
        ) -> (Self, Arc<Mutex<Vec<i64>>>) {
            let offsets = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    responses: Mutex::new(script.into()),
                    offsets: Arc::clone(&offsets),
                },
                offsets,
            )
        }
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn fetch_updates(
            &self,
            params: GetUpdates,
        ) -> Result<ApiResponse<Vec<Update>>, SourceError> {
            self.offsets
                .lock()
                .unwrap()
                .push(params.offset.unwrap_or(-1));
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(envelope)) => Ok(envelope),
                Some(Err(message)) => Err(message.into()),
                // Script exhausted: act like an empty long poll.
                None => Ok(ApiResponse::ok(vec![])),
            }
        }
    }

    fn message_update(id: i64) -> Update {
        Update {
            update_id: id,
            message: Some(Message {
                message_id: id,
                date: 0,
                chat: Chat {
                    id: 1,
                    chat_type: "private".to_owned(),
                    title: None,
                    username: None,
                    first_name: None,
                    last_name: None,
                },
                from: None,
                text: Some("hi".to_owned()),
                entities: vec![],
                caption: None,
                edit_date: None,
                reply_to_message: None,
            }),
            edited_message: None,
            channel_post: None,
            edited_channel_post: None,
            inline_query: None,
            chosen_inline_result: None,
            callback_query: None,
            shipping_query: None,
            pre_checkout_query: None,
        }
    }

    fn bare_update(id: i64) -> Update {
        Update {
            message: None,
            ..message_update(id)
        }
    }

    #[tokio::test]
    async fn test_offsets_follow_the_batches() {
        let (source, offsets) = ScriptedSource::new(vec![
            Ok(ApiResponse::ok(vec![message_update(5)])),
            Ok(ApiResponse::ok(vec![message_update(8), message_update(9)])),
        ]);
        let router = Arc::new(UpdateRouter::new());
        let mut poller = UpdatePoller::new(source, router, PollerConfig::default());

        poller.run_cycle().await;
        poller.run_cycle().await;
        poller.run_cycle().await;

        assert_eq!(*offsets.lock().unwrap(), vec![0, 6, 10]);
        assert_eq!(poller.offset(), 10);
        assert_eq!(poller.state(), PollerState::Idle);
    }

    #[tokio::test]
    async fn test_batch_is_delivered_in_arrival_order() {
        let (source, _) = ScriptedSource::new(vec![Ok(ApiResponse::ok(vec![
            message_update(3),
            message_update(4),
        ]))]);
        let router = Arc::new(UpdateRouter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = router.subscribe(
            move |update| seen_clone.lock().unwrap().push(update.id),
            |_| {},
        );

        let mut poller = UpdatePoller::new(source, router, PollerConfig::default());
        poller.run_cycle().await;

        assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_api_error_is_fanned_out_and_polling_continues() {
        let (source, offsets) = ScriptedSource::new(vec![
            Ok(ApiResponse {
                ok: false,
                result: None,
                error_code: Some(401),
                description: Some("Unauthorized".to_owned()),
                parameters: None,
            }),
            Ok(ApiResponse::ok(vec![message_update(2)])),
        ]);
        let router = Arc::new(UpdateRouter::new());
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = Arc::clone(&errors);
        let _sub = router.subscribe(
            |_| {},
            move |error| errors_clone.lock().unwrap().push(error.to_string()),
        );

        let mut poller = UpdatePoller::new(source, router, PollerConfig::default());
        poller.run_cycle().await;
        poller.run_cycle().await;

        assert_eq!(
            *errors.lock().unwrap(),
            vec!["api error 401: Unauthorized".to_owned()]
        );
        // The failed cycle did not move the cursor.
        assert_eq!(*offsets.lock().unwrap(), vec![0, 0]);
        assert_eq!(poller.offset(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_is_fanned_out() {
        let (source, _) = ScriptedSource::new(vec![Err("connection reset".to_owned())]);
        let router = Arc::new(UpdateRouter::new());
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = Arc::clone(&errors);
        let _sub = router.subscribe(
            |_| {},
            move |error| errors_clone.lock().unwrap().push(error.to_string()),
        );

        let mut poller = UpdatePoller::new(source, router, PollerConfig::default());
        poller.run_cycle().await;

        assert_eq!(
            *errors.lock().unwrap(),
            vec!["transport error: connection reset".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_unclassifiable_updates_are_skipped_but_acknowledged() {
        let (source, offsets) = ScriptedSource::new(vec![Ok(ApiResponse::ok(vec![
            bare_update(7),
            message_update(8),
        ]))]);
        let router = Arc::new(UpdateRouter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = router.subscribe(
            move |update| seen_clone.lock().unwrap().push(update.id),
            |_| {},
        );

        let mut poller = UpdatePoller::new(source, router, PollerConfig::default());
        poller.run_cycle().await;
        poller.run_cycle().await;

        // Only the well-formed update was delivered, but the cursor
        // moved past both.
        assert_eq!(*seen.lock().unwrap(), vec![8]);
        assert_eq!(*offsets.lock().unwrap(), vec![0, 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown_and_preserves_cursor() {
        let (source, offsets) = ScriptedSource::new(vec![Ok(ApiResponse::ok(vec![
            message_update(5),
        ]))]);
        let router = Arc::new(UpdateRouter::new());
        let mut poller = UpdatePoller::new(source, router, PollerConfig::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            poller.run(shutdown_rx).await;
            poller
        });

        // Let a few cycles run on virtual time, then stop.
        tokio::time::sleep(Duration::from_secs(3)).await;
        shutdown_tx.send(true).unwrap();
        let poller = handle.await.unwrap();

        assert_eq!(poller.state(), PollerState::Stopped);
        assert_eq!(poller.offset(), 6);
        let offsets = offsets.lock().unwrap();
        assert!(!offsets.is_empty());
        assert_eq!(offsets[0], 0);
        // Every fetch after the first batch requested the advanced offset.
        assert!(offsets.iter().skip(1).all(|&offset| offset == 6));
    }
}

//! Broadcast fan-out of classified updates.
//!
//! One router instance fans every emitted update out to:
//! - every combined-stream subscriber (callback or channel),
//! - every subscriber registered for the update's kind.
//!
//! Delivery is synchronous and follows emission order; there is no
//! reordering buffer.  Subscriber lists may be mutated while an emit is
//! in flight: `emit` snapshots the list before invoking callbacks, so an
//! unsubscribe during emission takes effect on the next emission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use tgwire_api::UpdateKind;

use super::types::TaggedUpdate;
use crate::poller::PollError;

/// Capacity of each broadcast channel backing the public streams.
///
/// Enough to absorb bursts while keeping memory bounded; a subscriber
/// that lags further than this sees a `Lagged` stream item rather than
/// blocking delivery for everyone else.
pub const BROADCAST_CHANNEL_CAPACITY: usize = 256;

type UpdateCallback = Arc<dyn Fn(&TaggedUpdate) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&PollError) + Send + Sync>;

struct CallbackEntry {
    id: u64,
    /// `None` subscribes to the combined stream.
    kind: Option<UpdateKind>,
    on_update: UpdateCallback,
    on_error: Option<ErrorCallback>,
}

/// A combined stream or per-kind stream of classified updates.
///
/// Wraps a broadcast receiver: every stream sees every matching update
/// emitted after it was created (broadcast, not competing-consumers).
pub type UpdateStream = BroadcastStream<TaggedUpdate>;

/// Routes classified updates to subscribers.
pub struct UpdateRouter {
    callbacks: Arc<Mutex<Vec<Arc<CallbackEntry>>>>,
    next_subscription_id: AtomicU64,
    /// Channel behind [`updates`](UpdateRouter::updates).
    update_tx: broadcast::Sender<TaggedUpdate>,
    /// One channel per kind, indexed by `UpdateKind::index()`.
    kind_txs: [broadcast::Sender<TaggedUpdate>; 9],
    /// Last delivered `(id, kind)` pair, for consecutive-duplicate
    /// suppression.
    last_delivered: Mutex<Option<(i64, UpdateKind)>>,
}

impl UpdateRouter {
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(BROADCAST_CHANNEL_CAPACITY);
        Self {
            callbacks: Arc::new(Mutex::new(Vec::new())),
            next_subscription_id: AtomicU64::new(0),
            update_tx,
            kind_txs: std::array::from_fn(|_| broadcast::channel(BROADCAST_CHANNEL_CAPACITY).0),
            last_delivered: Mutex::new(None),
        }
    }

    /// Subscribe to the combined stream with an update callback and an
    /// error callback.
    ///
    /// Every subscription receives every update independently.  The
    /// returned handle's [`unsubscribe`](Subscription::unsubscribe)
    /// removes both callbacks; dropping the handle does not.
    pub fn subscribe(
        &self,
        on_update: impl Fn(&TaggedUpdate) + Send + Sync + 'static,
        on_error: impl Fn(&PollError) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(None, Arc::new(on_update), Some(Arc::new(on_error)))
    }

    /// Subscribe to a single kind's stream with an update callback.
    pub fn subscribe_kind(
        &self,
        kind: UpdateKind,
        on_update: impl Fn(&TaggedUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(Some(kind), Arc::new(on_update), None)
    }

    fn register(
        &self,
        kind: Option<UpdateKind>,
        on_update: UpdateCallback,
        on_error: Option<ErrorCallback>,
    ) -> Subscription {
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        let entry = Arc::new(CallbackEntry {
            id,
            kind,
            on_update,
            on_error,
        });
        self.lock_callbacks().push(entry);
        Subscription {
            id,
            callbacks: Arc::clone(&self.callbacks),
        }
    }

    /// The combined stream as an async channel.
    pub fn updates(&self) -> UpdateStream {
        BroadcastStream::new(self.update_tx.subscribe())
    }

    /// A single kind's stream as an async channel.
    pub fn updates_of(&self, kind: UpdateKind) -> UpdateStream {
        BroadcastStream::new(self.kind_txs[kind.index()].subscribe())
    }

    /// Deliver one classified update to the combined stream and to the
    /// matching kind's stream, synchronously and in emission order.
    ///
    /// A `(id, kind)` pair equal to the immediately preceding delivery
    /// is suppressed: redelivery guard for sources that can repeat
    /// themselves (webhook retries, misconfigured polling).  Best
    /// effort only — non-consecutive repeats pass through.
    pub fn emit(&self, update: TaggedUpdate) {
        {
            let mut last = self.lock_last_delivered();
            if *last == Some((update.id, update.kind)) {
                debug!(
                    update_id = update.id,
                    kind = %update.kind,
                    "Suppressing consecutive duplicate delivery"
                );
                return;
            }
            *last = Some((update.id, update.kind));
        }

        let snapshot: Vec<Arc<CallbackEntry>> = self.lock_callbacks().clone();
        for entry in snapshot {
            match entry.kind {
                None => (entry.on_update)(&update),
                Some(kind) if kind == update.kind => (entry.on_update)(&update),
                Some(_) => {}
            }
        }

        // Streams: a send error only means no receiver is currently
        // subscribed.
        let _ = self.kind_txs[update.kind.index()].send(update.clone());
        let _ = self.update_tx.send(update);
    }

    /// Deliver a failure to every registered error callback.
    pub fn emit_error(&self, error: &PollError) {
        let snapshot: Vec<Arc<CallbackEntry>> = self.lock_callbacks().clone();
        for entry in snapshot {
            if let Some(on_error) = &entry.on_error {
                on_error(error);
            }
        }
    }

    /// Number of live subscriptions (callback-based only).
    pub fn subscription_count(&self) -> usize {
        self.lock_callbacks().len()
    }

    fn lock_callbacks(&self) -> std::sync::MutexGuard<'_, Vec<Arc<CallbackEntry>>> {
        // A panicking subscriber callback may poison the lock; the list
        // itself is still consistent, so keep routing.
        match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_last_delivered(&self) -> std::sync::MutexGuard<'_, Option<(i64, UpdateKind)>> {
        match self.last_delivered.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for UpdateRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to an active callback subscription.
pub struct Subscription {
    id: u64,
    callbacks: Arc<Mutex<Vec<Arc<CallbackEntry>>>>,
}

impl Subscription {
    /// Remove this subscription's callbacks.  No further emissions will
    /// invoke them; an emission already snapshotted keeps its copy.
    pub fn unsubscribe(self) {
        let mut callbacks = match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        callbacks.retain(|entry| entry.id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::UpdatePayload;
    use tgwire_api::types::{CallbackQuery, Chat, Message, User};
    use tokio_stream::StreamExt;

    fn tagged_message(id: i64) -> TaggedUpdate {
        TaggedUpdate::new(
            id,
            UpdatePayload::Message(Message {
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
        )
    }

    fn tagged_callback(id: i64) -> TaggedUpdate {
        TaggedUpdate::new(
            id,
            UpdatePayload::CallbackQuery(CallbackQuery {
                id: "c".to_owned(),
                from: User {
                    id: 2,
                    is_bot: false,
                    first_name: "u".to_owned(),
                    last_name: None,
                    username: None,
                    language_code: None,
                },
                message: None,
                inline_message_id: None,
                data: None,
            }),
        )
    }

    #[test]
    fn test_combined_subscriber_sees_every_kind() {
        let router = UpdateRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = router.subscribe(
            move |update| seen_clone.lock().unwrap().push((update.id, update.kind)),
            |_| {},
        );

        router.emit(tagged_message(1));
        router.emit(tagged_callback(2));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (1, UpdateKind::Message),
                (2, UpdateKind::CallbackQuery)
            ]
        );
    }

    #[test]
    fn test_kind_subscriber_is_isolated() {
        let router = UpdateRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = router.subscribe_kind(UpdateKind::CallbackQuery, move |update| {
            seen_clone.lock().unwrap().push(update.id)
        });

        router.emit(tagged_message(1));
        router.emit(tagged_callback(2));

        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let router = UpdateRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let sub_a = router.subscribe(
            move |update| seen_a.lock().unwrap().push(("a", update.id)),
            |_| {},
        );
        let seen_b = Arc::clone(&seen);
        let _sub_b = router.subscribe(
            move |update| seen_b.lock().unwrap().push(("b", update.id)),
            |_| {},
        );

        router.emit(tagged_message(1));
        sub_a.unsubscribe();
        router.emit(tagged_message(2));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a", 1), ("b", 1), ("b", 2)]
        );
    }

    #[test]
    fn test_consecutive_duplicate_is_suppressed() {
        let router = UpdateRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = router.subscribe(
            move |update| seen_clone.lock().unwrap().push(update.id),
            |_| {},
        );

        router.emit(tagged_message(1));
        router.emit(tagged_message(1));
        router.emit(tagged_message(2));
        // Not consecutive any more: passes through.
        router.emit(tagged_message(1));

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);
    }

    #[test]
    fn test_same_id_different_kind_is_not_a_duplicate() {
        let router = UpdateRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = router.subscribe(
            move |update| seen_clone.lock().unwrap().push(update.kind),
            |_| {},
        );

        router.emit(tagged_message(1));
        router.emit(tagged_callback(1));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![UpdateKind::Message, UpdateKind::CallbackQuery]
        );
    }

    #[test]
    fn test_error_fanout_reaches_every_error_callback() {
        let router = UpdateRouter::new();
        let errors = Arc::new(Mutex::new(Vec::new()));

        let errors_a = Arc::clone(&errors);
        let _sub_a = router.subscribe(
            |_| {},
            move |error| errors_a.lock().unwrap().push(error.to_string()),
        );
        let errors_b = Arc::clone(&errors);
        let _sub_b = router.subscribe(
            |_| {},
            move |error| errors_b.lock().unwrap().push(error.to_string()),
        );

        router.emit_error(&PollError::Api {
            error_code: 401,
            description: "Unauthorized".to_owned(),
        });

        assert_eq!(errors.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unsubscribe_during_emit_takes_effect_next_emission() {
        let router = Arc::new(UpdateRouter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let seen_clone = Arc::clone(&seen);
        let slot_clone = Arc::clone(&slot);
        let sub = router.subscribe(
            move |update| {
                seen_clone.lock().unwrap().push(update.id);
                // Unsubscribe ourselves from inside the callback.
                if let Some(subscription) = slot_clone.lock().unwrap().take() {
                    subscription.unsubscribe();
                }
            },
            |_| {},
        );
        *slot.lock().unwrap() = Some(sub);

        router.emit(tagged_message(1));
        router.emit(tagged_message(2));

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_streams_receive_matching_updates() {
        let router = UpdateRouter::new();
        let mut all = router.updates();
        let mut callbacks_only = router.updates_of(UpdateKind::CallbackQuery);

        router.emit(tagged_message(1));
        router.emit(tagged_callback(2));

        assert_eq!(all.next().await.unwrap().unwrap().id, 1);
        assert_eq!(all.next().await.unwrap().unwrap().id, 2);
        assert_eq!(callbacks_only.next().await.unwrap().unwrap().id, 2);
    }
}

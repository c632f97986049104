//! Offset tracking for polling delivery.

use tgwire_api::Update;

/// The next-offset position of a polling run.
///
/// Owned exclusively by one [`UpdatePoller`](crate::poller::UpdatePoller)
/// instance; never persisted.  An update is considered acknowledged once
/// a fetch is issued with an offset above its id, so the cursor always
/// holds one past the highest id seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCursor {
    next_offset: i64,
}

impl UpdateCursor {
    /// A cursor that has consumed nothing: the first fetch requests the
    /// start of the retained update history.
    pub fn new() -> Self {
        Self { next_offset: 0 }
    }

    /// The offset the next fetch should request.
    pub fn current(&self) -> i64 {
        self.next_offset
    }

    /// Advance past a fetched batch.  No-op on an empty batch; otherwise
    /// the cursor moves to `max(update_id) + 1` and never decreases.
    pub fn advance(&mut self, batch: &[Update]) {
        let Some(max_id) = batch.iter().map(|update| update.update_id).max() else {
            return;
        };
        self.next_offset = self.next_offset.max(max_id + 1);
    }
}

impl Default for UpdateCursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: i64) -> Update {
        Update {
            update_id: id,
            message: None,
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

    #[test]
    fn test_fresh_cursor_requests_from_the_beginning() {
        assert_eq!(UpdateCursor::new().current(), 0);
    }

    #[test]
    fn test_advance_moves_one_past_max_id() {
        let mut cursor = UpdateCursor::new();
        cursor.advance(&[update(5)]);
        assert_eq!(cursor.current(), 6);
        cursor.advance(&[update(8), update(9)]);
        assert_eq!(cursor.current(), 10);
    }

    #[test]
    fn test_empty_batch_is_a_noop() {
        let mut cursor = UpdateCursor::new();
        cursor.advance(&[update(5)]);
        cursor.advance(&[]);
        assert_eq!(cursor.current(), 6);
    }

    #[test]
    fn test_cursor_never_decreases() {
        let mut cursor = UpdateCursor::new();
        cursor.advance(&[update(9)]);
        cursor.advance(&[update(3)]);
        assert_eq!(cursor.current(), 10);
    }

    #[test]
    fn test_monotone_over_a_sequence() {
        let mut cursor = UpdateCursor::new();
        let before = cursor.current();
        for batch in [[update(1)], [update(2)], [update(7)]] {
            cursor.advance(&batch);
        }
        assert!(cursor.current() > before);
        assert_eq!(cursor.current(), 8);
    }
}

//! Pending queue: strict FIFO buffer of not-yet-dispatched envelopes.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::message::{Envelope, Message, TypeTag};

/// Shared FIFO of pending envelopes.
///
/// Clones share the same buffer. Push appends at the tail; dispatch removes
/// from the head only after a handler was found for it. The queue never
/// reorders: an unmatched head blocks everything behind it until a handler
/// for its type shows up.
#[derive(Clone, Default)]
pub struct PendingQueue {
    inner: Arc<Mutex<VecDeque<Envelope>>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an envelope at the tail. Never fails.
    pub async fn push(&self, envelope: Envelope) {
        let mut queue = self.inner.lock().await;
        queue.push_back(envelope);
    }

    /// Tag of the head envelope, without removing it.
    pub async fn peek_tag(&self) -> Option<TypeTag> {
        let queue = self.inner.lock().await;
        queue.front().map(Envelope::tag)
    }

    /// Claim the head, but only if its tag still matches `tag`.
    ///
    /// Peek and claim are separate lock scopes, so between the two another
    /// driver may have taken the head. Re-checking the tag here means a stale
    /// handler lookup can never walk off with somebody else's message.
    pub async fn pop_if_tag(&self, tag: TypeTag) -> Option<Envelope> {
        let mut queue = self.inner.lock().await;
        if queue.front().map(Envelope::tag) != Some(tag) {
            return None;
        }
        queue.pop_front()
    }

    pub async fn len(&self) -> usize {
        let queue = self.inner.lock().await;
        queue.len()
    }

    pub async fn is_empty(&self) -> bool {
        let queue = self.inner.lock().await;
        queue.is_empty()
    }

    /// Push-only view for handlers and producers.
    pub fn push_handle(&self) -> PushHandle {
        PushHandle {
            queue: self.clone(),
        }
    }
}

/// Push-only capability over a [`PendingQueue`].
///
/// Handlers receive one of these so they can push follow-up messages into the
/// inbox they are running under. Pushing only takes the queue lock briefly,
/// and dispatch never holds that lock across a handler await, so re-entrant
/// pushes cannot deadlock.
#[derive(Clone)]
pub struct PushHandle {
    queue: PendingQueue,
}

impl PushHandle {
    pub async fn push<M: Message>(&self, message: M) {
        self.queue.push(Envelope::new(message)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First(u32);
    struct Second;

    impl Message for First {}
    impl Message for Second {}

    #[tokio::test]
    async fn push_preserves_fifo_order() {
        let queue = PendingQueue::new();
        queue.push(Envelope::new(First(1))).await;
        queue.push(Envelope::new(Second)).await;

        assert_eq!(queue.peek_tag().await, Some(TypeTag::of::<First>()));
        let head = queue.pop_if_tag(TypeTag::of::<First>()).await.unwrap();
        assert_eq!(head.downcast::<First>().unwrap().0, 1);
        assert_eq!(queue.peek_tag().await, Some(TypeTag::of::<Second>()));
    }

    #[tokio::test]
    async fn peek_does_not_remove() {
        let queue = PendingQueue::new();
        queue.push(Envelope::new(Second)).await;

        assert_eq!(queue.peek_tag().await, Some(TypeTag::of::<Second>()));
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn pop_if_tag_refuses_a_stale_tag() {
        let queue = PendingQueue::new();
        queue.push(Envelope::new(First(7))).await;

        assert!(queue.pop_if_tag(TypeTag::of::<Second>()).await.is_none());
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn empty_queue_has_no_head() {
        let queue = PendingQueue::new();
        assert_eq!(queue.peek_tag().await, None);
        assert!(queue.pop_if_tag(TypeTag::of::<First>()).await.is_none());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn push_handle_feeds_the_same_buffer() {
        let queue = PendingQueue::new();
        let handle = queue.push_handle();
        handle.push(First(3)).await;

        assert_eq!(queue.peek_tag().await, Some(TypeTag::of::<First>()));
    }
}

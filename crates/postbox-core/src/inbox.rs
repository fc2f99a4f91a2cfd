//! Exclusive inbox: one handler per message type, one message per step.

use tokio::sync::Mutex;

use crate::error::InboxError;
use crate::handler::Handler;
use crate::message::{Envelope, Message};
use crate::queue::{PendingQueue, PushHandle};
use crate::registry::HandlerRegistry;
use crate::status::InboxStatus;

/// Exclusive-dispatch inbox.
///
/// Composes a [`HandlerRegistry`] and a [`PendingQueue`]. Each
/// [`try_process_next`](Inbox::try_process_next) call handles at most one
/// message, through exactly one handler. Handlers can be registered before or
/// after messages of their type are queued; an unmatched head simply waits
/// (deferred binding).
#[derive(Default)]
pub struct Inbox {
    registry: HandlerRegistry,
    queue: PendingQueue,
    // Non-blocking exclusivity guard: overlapping try_process_next calls must
    // back off immediately, not queue behind each other.
    process_guard: Mutex<()>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message. Never fails, never dispatches by itself.
    pub async fn push<M: Message>(&self, message: M) {
        self.queue.push(Envelope::new(message)).await;
    }

    /// Bind the handler for the variant `M`.
    ///
    /// Errors with [`InboxError::DuplicateHandler`] if `M` is already bound.
    pub async fn register<M, H>(&self, handler: H) -> Result<(), InboxError>
    where
        M: Message,
        H: Handler<M> + 'static,
    {
        self.registry.register::<M, H>(handler).await
    }

    /// Push-only handle for producers and handler bodies.
    pub fn handle(&self) -> PushHandle {
        self.queue.push_handle()
    }

    /// Attempt one processing step.
    ///
    /// Returns `Ok(false)` when nothing happened: empty queue, no handler for
    /// the head's type (the head stays queued), or another caller is already
    /// processing. Returns `Ok(true)` after the head was dispatched and its
    /// handler completed. A handler error propagates to the caller; the
    /// message was already dequeued by then, so the failure must not vanish.
    pub async fn try_process_next(&self) -> Result<bool, InboxError> {
        let Ok(_guard) = self.process_guard.try_lock() else {
            return Ok(false);
        };

        let Some(tag) = self.queue.peek_tag().await else {
            return Ok(false);
        };
        let Some(handler) = self.registry.get(tag).await else {
            return Ok(false);
        };
        let Some(envelope) = self.queue.pop_if_tag(tag).await else {
            return Ok(false);
        };

        // No queue lock is held here, so the handler is free to push.
        let push = self.handle();
        handler.handle_dyn(&push, envelope).await?;
        Ok(true)
    }

    pub async fn pending(&self) -> usize {
        self.queue.len().await
    }

    pub async fn status(&self) -> InboxStatus {
        InboxStatus {
            pending: self.queue.len().await,
            registered_types: self.registry.registered_types().await,
        }
    }
}

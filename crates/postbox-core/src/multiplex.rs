//! Fan-out inbox: every registered handler for a type runs on each match.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

use crate::error::InboxError;
use crate::handler::Handler;
use crate::message::{Envelope, Message};
use crate::queue::{PendingQueue, PushHandle};
use crate::registry::FanoutRegistry;
use crate::status::{BatchReport, InboxStatus};

/// Time granted to each handler of a batch before the dispatcher stops
/// waiting.
pub const DEFAULT_HANDLER_ALLOWANCE: Duration = Duration::from_millis(100);

/// Fan-out dispatch inbox.
///
/// Same surface as [`Inbox`](crate::Inbox), but registration appends instead
/// of failing, and a processing step invokes the whole handler list for the
/// head's type concurrently. The wait for the batch is bounded by
/// `handler count x per-handler allowance`; handlers still running when that
/// budget elapses are left to finish on their own, they are just no longer
/// awaited. Handlers here are best-effort: a slow or wedged one must not
/// stall the pipeline, and killing it mid-flight is worse than letting it
/// run out the clock.
pub struct MultiplexInbox {
    registry: FanoutRegistry,
    queue: PendingQueue,
    allowance: Duration,
    last_batch: Mutex<Option<BatchReport>>,
}

impl MultiplexInbox {
    /// Create an inbox granting `allowance` of wait time per handler.
    pub fn new(allowance: Duration) -> Self {
        Self {
            registry: FanoutRegistry::new(),
            queue: PendingQueue::new(),
            allowance,
            last_batch: Mutex::new(None),
        }
    }

    /// Enqueue a message. Never fails, never dispatches by itself.
    pub async fn push<M: Message>(&self, message: M) {
        self.queue.push(Envelope::new(message)).await;
    }

    /// Append a handler for the variant `M`.
    ///
    /// Unlike the exclusive inbox this never fails: each registration joins
    /// the list for `M` behind the earlier ones, and the whole list is
    /// invoked on a future match. Registrations landing while a batch is in
    /// flight only affect later messages (batches dispatch against a
    /// snapshot).
    pub async fn register<M, H>(&self, handler: H)
    where
        M: Message,
        H: Handler<M> + 'static,
    {
        self.registry.register::<M, H>(handler).await;
    }

    /// Push-only handle for producers and handler bodies.
    pub fn handle(&self) -> PushHandle {
        self.queue.push_handle()
    }

    /// Attempt one fan-out processing step.
    ///
    /// Returns `Ok(false)` when the queue is empty or the head's type has no
    /// handlers (the head stays queued). Otherwise the head is dequeued once,
    /// every handler in the snapshot is spawned in registration order, and
    /// the call waits for the batch under the shared deadline. Returning
    /// `Ok(true)` means the batch was issued, not that every handler
    /// completed; per-handler failures are isolated and tallied in the
    /// [`BatchReport`], never raised here.
    pub async fn try_process_next(&self) -> Result<bool, InboxError> {
        let Some(tag) = self.queue.peek_tag().await else {
            return Ok(false);
        };
        let Some(handlers) = self.registry.snapshot(tag).await else {
            return Ok(false);
        };
        let Some(envelope) = self.queue.pop_if_tag(tag).await else {
            return Ok(false);
        };

        let push = self.handle();
        let mut joins: Vec<JoinHandle<Result<(), InboxError>>> =
            Vec::with_capacity(handlers.len());
        for handler in handlers {
            let push = push.clone();
            let envelope = envelope.clone();
            joins.push(tokio::spawn(async move {
                handler.handle_dyn(&push, envelope).await
            }));
        }

        let total = joins.len();
        let budget = self.allowance.saturating_mul(total as u32);
        let deadline = Instant::now() + budget;

        let mut completed = 0;
        let mut failed = 0;
        for join in joins {
            match timeout_at(deadline, join).await {
                Ok(Ok(Ok(()))) => completed += 1,
                Ok(Ok(Err(err))) => {
                    failed += 1;
                    warn!(message_type = %tag, error = %err, "fan-out handler failed");
                }
                Ok(Err(join_err)) => {
                    failed += 1;
                    warn!(message_type = %tag, error = %join_err, "fan-out handler panicked");
                }
                // Deadline elapsed: the handle is dropped, which detaches the
                // task rather than aborting it.
                Err(_) => {}
            }
        }

        let report = BatchReport {
            message_type: tag.name().to_string(),
            handlers: total,
            completed,
            failed,
            unfinished: total - completed - failed,
        };
        if report.timed_out() {
            warn!(
                message_type = %tag,
                unfinished = report.unfinished,
                budget_ms = budget.as_millis() as u64,
                "fan-out wait budget elapsed before all handlers finished"
            );
        }
        *self.last_batch.lock().await = Some(report);

        Ok(true)
    }

    /// Report of the most recently issued batch, if any.
    pub async fn last_batch(&self) -> Option<BatchReport> {
        self.last_batch.lock().await.clone()
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

impl Default for MultiplexInbox {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER_ALLOWANCE)
    }
}

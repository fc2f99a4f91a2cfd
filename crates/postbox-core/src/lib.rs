//! postbox-core
//!
//! In-process typed message inbox: producers push messages of a common base
//! kind into a strict-FIFO queue, consumers register per-concrete-type
//! handlers, and a driver processes one message per step.
//!
//! # Modules
//! - **message**: `Message` marker, `TypeTag` runtime identity, `Envelope`
//! - **handler**: `Handler<M>` / `DynHandler` traits, type-erasure adapter
//! - **queue**: pending FIFO + push-only handle for re-entrant pushes
//! - **registry**: exclusive and fan-out handler registries
//! - **inbox**: exclusive dispatch (one handler per type, try-lock exclusivity)
//! - **multiplex**: fan-out dispatch (all handlers per type, bounded wait)
//! - **status**: serializable diagnostics views
//! - **error**: `InboxError`
//!
//! # Dispatch policy
//! Messages are never reordered and never dropped: a head message with no
//! registered handler stays put until somebody registers for its type. The
//! exclusive inbox propagates handler failures to the driver; the fan-out
//! inbox isolates them per handler and bounds its wait, without cancelling
//! work that outlives the budget.

pub mod error;
pub mod handler;
pub mod inbox;
pub mod message;
pub mod multiplex;
pub mod queue;
pub mod registry;
pub mod status;

pub use self::error::InboxError;
pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::inbox::Inbox;
pub use self::message::{Envelope, Message, TypeTag};
pub use self::multiplex::{DEFAULT_HANDLER_ALLOWANCE, MultiplexInbox};
pub use self::queue::{PendingQueue, PushHandle};
pub use self::registry::{FanoutRegistry, HandlerRegistry};
pub use self::status::{BatchReport, InboxStatus};

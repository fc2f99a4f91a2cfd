//! Handler traits and the type-erasure adapter between them.
//!
//! Two layers:
//! - `Handler<M>`: what users implement, typed to one message variant.
//! - `DynHandler`: object-safe erased form the registries store.
//!
//! `TypedHandler<M, H>` bridges the two by downcasting the envelope back to
//! the variant the handler was registered for.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::InboxError;
use crate::message::{Envelope, Message, TypeTag};
use crate::queue::PushHandle;
use std::sync::Arc;

/// A handler for one concrete message variant.
///
/// The `inbox` argument is a push-only handle to the owning inbox, so a
/// handler can enqueue follow-up messages (the classic request/response
/// pattern). Pushed messages become visible to later processing steps.
///
/// ```ignore
/// struct EchoHandler;
///
/// #[async_trait]
/// impl Handler<UserRequest> for EchoHandler {
///     async fn handle(&self, inbox: &PushHandle, request: Arc<UserRequest>) -> Result<(), InboxError> {
///         inbox.push(UserResponse::from(&*request)).await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<M: Message>: Send + Sync {
    async fn handle(&self, inbox: &PushHandle, message: Arc<M>) -> Result<(), InboxError>;
}

/// Object-safe form of [`Handler`], keyed storage for the registries.
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, inbox: &PushHandle, envelope: Envelope) -> Result<(), InboxError>;

    /// Tag of the variant this handler was registered for.
    fn type_tag(&self) -> TypeTag;
}

/// Adapter from a typed [`Handler`] to a [`DynHandler`].
pub struct TypedHandler<M: Message, H: Handler<M>> {
    handler: H,
    _marker: PhantomData<fn(M)>,
}

impl<M: Message, H: Handler<M>> TypedHandler<M, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<M: Message, H: Handler<M>> DynHandler for TypedHandler<M, H> {
    async fn handle_dyn(&self, inbox: &PushHandle, envelope: Envelope) -> Result<(), InboxError> {
        let message = envelope.downcast::<M>()?;
        self.handler.handle(inbox, message).await
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<M>()
    }
}

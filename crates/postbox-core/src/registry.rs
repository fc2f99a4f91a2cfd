//! Handler registries: type tag -> handler (exclusive) or handler list (fan-out).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::InboxError;
use crate::handler::{DynHandler, Handler, TypedHandler};
use crate::message::{Message, TypeTag};

/// Exclusive registry: at most one handler per message type.
///
/// Lookup misses are a normal outcome ("no consumer yet"), never an error;
/// duplicate registration is.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<TypeTag, Arc<dyn DynHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler for the variant `M`.
    ///
    /// Fails if `M` already has one; a bound handler is never silently
    /// overwritten.
    pub async fn register<M, H>(&self, handler: H) -> Result<(), InboxError>
    where
        M: Message,
        H: Handler<M> + 'static,
    {
        let tag = TypeTag::of::<M>();
        let mut handlers = self.handlers.lock().await;
        if handlers.contains_key(&tag) {
            return Err(InboxError::DuplicateHandler(tag));
        }
        handlers.insert(tag, Arc::new(TypedHandler::new(handler)));
        Ok(())
    }

    pub async fn get(&self, tag: TypeTag) -> Option<Arc<dyn DynHandler>> {
        let handlers = self.handlers.lock().await;
        handlers.get(&tag).cloned()
    }

    pub async fn registered_types(&self) -> Vec<String> {
        let handlers = self.handlers.lock().await;
        handlers.keys().map(|tag| tag.name().to_string()).collect()
    }

    pub async fn len(&self) -> usize {
        let handlers = self.handlers.lock().await;
        handlers.len()
    }

    pub async fn is_empty(&self) -> bool {
        let handlers = self.handlers.lock().await;
        handlers.is_empty()
    }
}

/// Fan-out registry: an ordered handler list per message type.
///
/// Registration appends; create-or-append happens under one lock so
/// concurrent registrations never lose an entry.
#[derive(Default)]
pub struct FanoutRegistry {
    handlers: Mutex<HashMap<TypeTag, Vec<Arc<dyn DynHandler>>>>,
}

impl FanoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for the variant `M`, creating the list if absent.
    ///
    /// Earlier registrations keep their position; a future match invokes the
    /// whole list in registration order.
    pub async fn register<M, H>(&self, handler: H)
    where
        M: Message,
        H: Handler<M> + 'static,
    {
        let tag = TypeTag::of::<M>();
        let mut handlers = self.handlers.lock().await;
        handlers
            .entry(tag)
            .or_default()
            .push(Arc::new(TypedHandler::new(handler)));
    }

    /// Clone the handler list for `tag`.
    ///
    /// In-flight batches dispatch against this snapshot; registrations made
    /// afterwards only affect later messages.
    pub async fn snapshot(&self, tag: TypeTag) -> Option<Vec<Arc<dyn DynHandler>>> {
        let handlers = self.handlers.lock().await;
        handlers.get(&tag).cloned()
    }

    pub async fn registered_types(&self) -> Vec<String> {
        let handlers = self.handlers.lock().await;
        handlers.keys().map(|tag| tag.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::PushHandle;
    use async_trait::async_trait;

    struct Ping;
    struct Pong;

    impl Message for Ping {}
    impl Message for Pong {}

    struct NoopHandler;

    #[async_trait]
    impl Handler<Ping> for NoopHandler {
        async fn handle(&self, _inbox: &PushHandle, _message: Arc<Ping>) -> Result<(), InboxError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Handler<Pong> for NoopHandler {
        async fn handle(&self, _inbox: &PushHandle, _message: Arc<Pong>) -> Result<(), InboxError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn register_then_get() {
        let registry = HandlerRegistry::new();
        registry.register::<Ping, _>(NoopHandler).await.unwrap();

        assert!(registry.get(TypeTag::of::<Ping>()).await.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_tag_is_a_miss_not_an_error() {
        let registry = HandlerRegistry::new();
        assert!(registry.get(TypeTag::of::<Ping>()).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let registry = HandlerRegistry::new();
        registry.register::<Ping, _>(NoopHandler).await.unwrap();

        let err = registry.register::<Ping, _>(NoopHandler).await.unwrap_err();
        assert!(matches!(err, InboxError::DuplicateHandler(_)));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn distinct_variants_do_not_collide() {
        let registry = HandlerRegistry::new();
        registry.register::<Ping, _>(NoopHandler).await.unwrap();
        registry.register::<Pong, _>(NoopHandler).await.unwrap();

        assert!(registry.get(TypeTag::of::<Ping>()).await.is_some());
        assert!(registry.get(TypeTag::of::<Pong>()).await.is_some());
    }

    #[tokio::test]
    async fn fanout_appends_instead_of_failing() {
        let registry = FanoutRegistry::new();
        registry.register::<Ping, _>(NoopHandler).await;
        registry.register::<Ping, _>(NoopHandler).await;
        registry.register::<Ping, _>(NoopHandler).await;

        let batch = registry.snapshot(TypeTag::of::<Ping>()).await.unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[tokio::test]
    async fn fanout_snapshot_is_detached_from_later_registrations() {
        let registry = FanoutRegistry::new();
        registry.register::<Ping, _>(NoopHandler).await;

        let batch = registry.snapshot(TypeTag::of::<Ping>()).await.unwrap();
        registry.register::<Ping, _>(NoopHandler).await;

        assert_eq!(batch.len(), 1);
        let fresh = registry.snapshot(TypeTag::of::<Ping>()).await.unwrap();
        assert_eq!(fresh.len(), 2);
    }

    #[tokio::test]
    async fn fanout_missing_tag_is_none() {
        let registry = FanoutRegistry::new();
        assert!(registry.snapshot(TypeTag::of::<Pong>()).await.is_none());
    }
}

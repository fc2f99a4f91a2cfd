//! Message model: the `Message` marker, runtime type tags, and envelopes.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::InboxError;

/// Marker for values that can travel through an inbox.
///
/// Implement this for every concrete message variant. Variants are plain
/// immutable values; the inbox never inspects their fields, only their
/// [`TypeTag`].
///
/// ```ignore
/// struct UserRequest {
///     message: String,
/// }
///
/// impl Message for UserRequest {}
/// ```
pub trait Message: Any + Send + Sync + 'static {}

/// Stable runtime identifier of a message's concrete variant.
///
/// Derived from the type, not the value: two messages of the same variant
/// compare equal, two different variants never do. Equality and hashing use
/// the [`TypeId`] only; the type name rides along for display.
#[derive(Debug, Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag of the concrete variant `M`.
    pub fn of<M: Message>() -> Self {
        Self {
            id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// Human-readable variant name, for status views and error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A queued message: the payload plus the tag captured at push time.
///
/// The payload is type-erased so one queue can carry every variant; the tag
/// is what the registries key on. Cloning is cheap (the payload is shared).
#[derive(Clone)]
pub struct Envelope {
    tag: TypeTag,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Envelope {
    pub fn new<M: Message>(message: M) -> Self {
        Self {
            tag: TypeTag::of::<M>(),
            payload: Arc::new(message),
        }
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Recover the concrete variant.
    ///
    /// Dispatch only reaches a handler whose tag matched the envelope, so a
    /// mismatch here means a registry bug; it surfaces as
    /// [`InboxError::TypeMismatch`] instead of a panic.
    pub fn downcast<M: Message>(self) -> Result<Arc<M>, InboxError> {
        let tag = self.tag;
        self.payload
            .downcast::<M>()
            .map_err(|_| InboxError::TypeMismatch(tag))
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope").field("tag", &self.tag).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Ping;

    #[derive(Debug)]
    struct Pong;

    impl Message for Ping {}
    impl Message for Pong {}

    #[test]
    fn same_variant_produces_equal_tags() {
        assert_eq!(TypeTag::of::<Ping>(), TypeTag::of::<Ping>());
    }

    #[test]
    fn different_variants_produce_unequal_tags() {
        assert_ne!(TypeTag::of::<Ping>(), TypeTag::of::<Pong>());
    }

    #[test]
    fn envelope_keeps_the_push_time_tag() {
        let env = Envelope::new(Ping);
        assert_eq!(env.tag(), TypeTag::of::<Ping>());
    }

    #[test]
    fn downcast_to_the_right_variant() {
        let env = Envelope::new(Ping);
        assert!(env.downcast::<Ping>().is_ok());
    }

    #[test]
    fn downcast_to_the_wrong_variant_is_an_error() {
        let env = Envelope::new(Ping);
        let err = env.downcast::<Pong>().unwrap_err();
        assert!(matches!(err, InboxError::TypeMismatch(_)));
    }
}

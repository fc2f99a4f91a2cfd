use thiserror::Error;

use crate::message::TypeTag;

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("duplicate handler for message type {0}")]
    DuplicateHandler(TypeTag),

    #[error("envelope payload does not match handler type {0}")]
    TypeMismatch(TypeTag),

    #[error("handler failed: {0}")]
    Handler(String),
}

impl InboxError {
    /// Shorthand for handler bodies reporting a domain failure.
    pub fn handler(message: impl Into<String>) -> Self {
        InboxError::Handler(message.into())
    }
}

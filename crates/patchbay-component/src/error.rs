//! Component layer errors.
//!
//! # Error Code Convention
//!
//! All component errors use the `COMPONENT_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`InvalidBuffer`](ComponentError::InvalidBuffer) | `COMPONENT_INVALID_BUFFER` | No |
//! | [`ChannelClosed`](ComponentError::ChannelClosed) | `COMPONENT_CHANNEL_CLOSED` | No |
//! | [`HandlerFailed`](ComponentError::HandlerFailed) | `COMPONENT_HANDLER_FAILED` | Yes |
//! | [`InvalidPayload`](ComponentError::InvalidPayload) | `COMPONENT_INVALID_PAYLOAD` | No |
//!
//! Configuration errors abort component construction. Handler errors are
//! caught by the handler loop, logged, and never terminate the loop: the
//! availability invariant is that a single bad message can never silence a
//! component.

use patchbay_msg::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Component layer error.
///
/// # Example
///
/// ```
/// use patchbay_component::ComponentError;
/// use patchbay_msg::ErrorCode;
///
/// let err = ComponentError::InvalidBuffer("fifo capacity must be > 0".into());
/// assert_eq!(err.code(), "COMPONENT_INVALID_BUFFER");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ComponentError {
    /// A buffer spec could not be used to build a channel.
    ///
    /// Raised at construction time; the component is never started.
    ///
    /// **Not recoverable** - fix the configuration.
    #[error("invalid buffer spec: {0}")]
    InvalidBuffer(String),

    /// A send or receive hit a closed channel.
    ///
    /// Seen by producers after the component has shut down.
    ///
    /// **Not recoverable** - the component is gone.
    #[error("channel closed")]
    ChannelClosed,

    /// A user handler returned an error.
    ///
    /// The handler loop logs this and continues with the next message.
    ///
    /// **Recoverable** - the next message is processed normally.
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// A handler rejected a message payload.
    ///
    /// **Not recoverable** - the payload will not parse on retry either.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ErrorCode for ComponentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidBuffer(_) => "COMPONENT_INVALID_BUFFER",
            Self::ChannelClosed => "COMPONENT_CHANNEL_CLOSED",
            Self::HandlerFailed(_) => "COMPONENT_HANDLER_FAILED",
            Self::InvalidPayload(_) => "COMPONENT_INVALID_PAYLOAD",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::HandlerFailed(_) => true,
            Self::InvalidBuffer(_) => false,
            Self::ChannelClosed => false,
            Self::InvalidPayload(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_msg::assert_error_codes;

    fn all_variants() -> Vec<ComponentError> {
        vec![
            ComponentError::InvalidBuffer("x".into()),
            ComponentError::ChannelClosed,
            ComponentError::HandlerFailed("x".into()),
            ComponentError::InvalidPayload("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "COMPONENT_");
    }

    #[test]
    fn handler_failed_is_recoverable() {
        let err = ComponentError::HandlerFailed("boom".into());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("handler failed"));
    }

    #[test]
    fn channel_closed_is_terminal() {
        let err = ComponentError::ChannelClosed;
        assert!(!err.is_recoverable());
        assert_eq!(err.code(), "COMPONENT_CHANNEL_CLOSED");
    }
}

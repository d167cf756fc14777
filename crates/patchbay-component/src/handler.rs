//! Handler registration and the per-invocation context.
//!
//! A component's behaviour lives in its handlers: async closures keyed by
//! [`MsgType`]. The registry is built once at component creation and never
//! mutated afterwards.
//!
//! Dispatch order for an ordered-input message:
//!
//! 1. the handler registered for the message type, if any
//! 2. otherwise the unhandled fallback, if registered
//! 3. the catch-all handler, on every message, regardless of the above
//!
//! The sliding input has a single dedicated handler (the state-snapshot
//! handler), invoked with the same context.
//!
//! A handler returns `Result<(), ComponentError>`. Errors are caught by
//! the handler loop, logged with the component ID and the offending
//! message, and never terminate the loop.

use crate::emit::Emitter;
use crate::error::ComponentError;
use crate::snapshot::SnapshotPublisher;
use crate::state::StateCell;
use patchbay_msg::{Msg, MsgType};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// What a handler invocation returns.
pub type HandlerResult = Result<(), ComponentError>;

type BoxedHandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A registered message handler.
///
/// Wraps an async closure taking the [`HandlerCtx`]. Construct with
/// [`Handler::new`] or, more commonly, let the component builder wrap
/// closures for you.
pub struct Handler<S>(Arc<dyn Fn(HandlerCtx<S>) -> BoxedHandlerFuture + Send + Sync>);

impl<S> Clone for Handler<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S> std::fmt::Debug for Handler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler(..)")
    }
}

impl<S> Handler<S> {
    /// Wraps an async closure as a handler.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HandlerCtx<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    pub(crate) fn call(&self, ctx: HandlerCtx<S>) -> BoxedHandlerFuture {
        (self.0)(ctx)
    }
}

/// Everything a handler invocation gets to work with.
///
/// | field | purpose |
/// |-------|---------|
/// | `msg` | the full message, metadata attached |
/// | `msg_type` | decomposed type tag |
/// | `payload` | decomposed payload |
/// | `state` | the component's state cell |
/// | `publisher` | snapshot publication |
/// | `emitter` | the only legal way to produce output |
pub struct HandlerCtx<S> {
    /// The message being handled, with metadata merged by the loop.
    pub msg: Msg,
    /// The message's type tag.
    pub msg_type: MsgType,
    /// The message's payload.
    pub payload: Value,
    /// The component's private state.
    pub state: StateCell<S>,
    /// Publishes state snapshots on the sliding-out channel.
    pub publisher: SnapshotPublisher,
    /// Emits messages on the component's out-channel.
    pub emitter: Emitter,
}

impl<S> Clone for HandlerCtx<S> {
    fn clone(&self) -> Self {
        Self {
            msg: self.msg.clone(),
            msg_type: self.msg_type.clone(),
            payload: self.payload.clone(),
            state: self.state.clone(),
            publisher: self.publisher.clone(),
            emitter: self.emitter.clone(),
        }
    }
}

impl<S> std::fmt::Debug for HandlerCtx<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCtx")
            .field("msg_type", &self.msg_type)
            .finish_non_exhaustive()
    }
}

/// The frozen handler set of one component.
#[derive(Debug)]
pub(crate) struct HandlerRegistry<S> {
    /// Type-keyed handlers for the ordered input.
    pub handlers: HashMap<MsgType, Handler<S>>,
    /// Invoked on every ordered message, after type dispatch.
    pub all_msgs: Option<Handler<S>>,
    /// Invoked for ordered messages with no registered handler.
    pub unhandled: Option<Handler<S>>,
    /// Invoked for every sliding-input message.
    pub state_pub: Option<Handler<S>>,
}

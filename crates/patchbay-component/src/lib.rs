//! Per-component runtime for patchbay.
//!
//! patchbay composes concurrent applications out of isolated,
//! single-responsibility components that communicate exclusively via
//! typed messages on asynchronous channels. This crate is the core: it
//! builds one component at a time - its channel set, handler loops,
//! state-snapshot publication, and firehose observability stream. Wiring
//! components together is the switchboard's job and lives outside this
//! crate; the surface it needs (input senders, output fan-outs, lifecycle
//! hooks) is exposed on the [`Component`] record.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  patchbay-msg       : Msg, MsgType, MsgMeta, IDs            │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  patchbay-component : channels, emitter, loops  ◄── HERE    │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  patchbay-cli       : demo wiring shell                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # A Component's Channels
//!
//! | channel | direction | buffering | carries |
//! |---------|-----------|-----------|---------|
//! | in | inbound | fifo | ordered commands |
//! | sliding-in | inbound | sliding | high-rate inputs, peer snapshots |
//! | out | outbound | fifo | handler emissions |
//! | sliding-out | outbound | sliding | own state snapshots |
//! | firehose | outbound | fifo | observability envelopes |
//!
//! The out-channel feeds a fan-out [`Mult`] and a type-keyed [`Pub`];
//! likewise the sliding-out channel. The firehose feeds a [`Mult`].
//!
//! # Concurrency Contract
//!
//! Each component hosts two long-running reader tasks, one per input
//! channel. Within the ordered input, messages are processed in send
//! order; between the two inputs there is no ordering guarantee. The
//! state cell is the only mutable resource, mutated solely from the
//! component's own handler invocations.
//!
//! # Modules
//!
//! - [`channel`]: channel factory over [`BufferSpec`] (fifo / sliding)
//! - [`mult`] / [`pubsub`]: fan-out and type-keyed distribution
//! - [`state`]: the watchable [`StateCell`]
//! - [`emit`]: the [`Emitter`], a component's only output path
//! - [`snapshot`]: snapshot publication and change detection
//! - [`handler`]: handler registration and the per-invocation context
//! - [`component`]: the factory and the assembled record

pub mod channel;
pub mod component;
pub mod config;
pub mod emit;
pub mod error;
mod firehose;
pub mod handler;
pub mod mult;
pub mod pubsub;
pub mod snapshot;
pub mod state;

pub use channel::{channel as make_channel, MsgReceiver, MsgSender};
pub use component::{Component, ComponentBuilder, StateInit};
pub use config::{BufferSpec, ComponentConfig};
pub use emit::Emitter;
pub use error::ComponentError;
pub use handler::{Handler, HandlerCtx, HandlerResult};
pub use mult::Mult;
pub use pubsub::Pub;
pub use snapshot::SnapshotPublisher;
pub use state::StateCell;

// Re-export the message vocabulary for convenience.
pub use patchbay_msg::{reserved, CmpId, CorrId, Msg, MsgTag, MsgType};

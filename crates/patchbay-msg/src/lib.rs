//! Message model for the patchbay component runtime.
//!
//! This crate defines the vocabulary that components exchange: namespaced
//! message types, the message record, and the out-of-band metadata every
//! message carries. It is deliberately free of async code so that anything
//! that talks *about* messages (tooling, transports, tests) can depend on
//! it without pulling in the runtime.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  patchbay-msg       : Msg, MsgType, MsgMeta, IDs  ◄── HERE  │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  patchbay-component : channels, emitter, handler loops      │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  patchbay-cli       : demo wiring shell                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Message Anatomy
//!
//! A message is `(type, payload)` plus metadata:
//!
//! - [`MsgType`] - namespaced tag `domain/name`, the dispatch key
//! - payload - opaque [`serde_json::Value`]
//! - [`MsgMeta`] - component sequence, correlation ID, tag, timings
//!
//! Two identifiers matter for tracing a message through a system:
//!
//! | ID | Lifetime | Purpose |
//! |----|----------|---------|
//! | [`CorrId`] | one emit | distinguishes individual sends |
//! | [`MsgTag`] | whole logical path | identifies the message across forwarding |
//!
//! # Example
//!
//! ```
//! use patchbay_msg::{CmpId, Direction, Msg, MsgType};
//! use serde_json::json;
//!
//! let mut msg = Msg::new(MsgType::new("ping", "req"), json!({"n": 1}));
//!
//! // The runtime records traversal steps as the message flows.
//! let sender = CmpId::new("c0");
//! msg.meta.record_step(&sender, Direction::Out);
//! msg.meta.stamp_out(&sender);
//!
//! assert_eq!(msg.meta.cmp_seq, vec![sender]);
//! ```
//!
//! # Reserved Types
//!
//! The runtime owns the message types in [`reserved`], including the whole
//! `firehose` namespace used for observability envelopes.

mod error;
mod id;
mod meta;
mod msg;
pub mod reserved;

pub use error::{assert_error_code, assert_error_codes, ErrorCode, MsgError};
pub use id::{CmpId, CorrId, MsgTag};
pub use meta::{epoch_millis, Direction, MsgMeta, Timing};
pub use msg::{Msg, MsgType};

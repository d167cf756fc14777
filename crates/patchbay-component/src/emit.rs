//! The emit function: a component's only output path.
//!
//! Handlers never touch the out-channel directly. They receive an
//! [`Emitter`] bound to their component, and everything they produce goes
//! through [`Emitter::emit`], which tags the message with the component's
//! identity before delivering it.
//!
//! # Metadata Rewrite
//!
//! On every emit:
//!
//! - a fresh correlation ID is assigned (always, including forwarding)
//! - a tag is assigned only if the message does not already carry one
//! - the component ID is appended to the sequence only if the sequence is
//!   empty (an initial send; forwarding leaves the path intact)
//! - the component's `out_ts` is stamped
//!
//! # Startup Buffering
//!
//! Emitted messages land on the internal put-channel, which is spliced
//! into the out-channel only when the switchboard signals system-ready.
//! Until then emits buffer in the put-channel; once its buffer fills,
//! `emit` suspends, so handlers must not busy-emit before the system is
//! ready.
//!
//! # Example
//!
//! ```ignore
//! builder.handler(MsgType::new("ping", "req"), |ctx| async move {
//!     let reply = Msg::new(MsgType::new("pong", "res"), ctx.payload.clone());
//!     ctx.emitter.emit(reply).await;
//!     Ok(())
//! })
//! ```

use crate::channel::MsgSender;
use crate::firehose::Firehose;
use patchbay_msg::{CmpId, CorrId, Direction, Msg, MsgTag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Per-component emit handle.
///
/// Cheap to clone; all clones share the shutdown flag, so emits stop
/// everywhere as soon as the component shuts down.
#[derive(Debug, Clone)]
pub struct Emitter {
    cmp_id: CmpId,
    put_tx: MsgSender,
    firehose: Firehose,
    closed: Arc<AtomicBool>,
}

impl Emitter {
    pub(crate) fn new(
        cmp_id: CmpId,
        put_tx: MsgSender,
        firehose: Firehose,
        closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            cmp_id,
            put_tx,
            firehose,
            closed,
        }
    }

    /// Returns the owning component's ID.
    #[must_use]
    pub fn cmp_id(&self) -> &CmpId {
        &self.cmp_id
    }

    /// Emits a message.
    ///
    /// Rewrites the metadata (see module docs), mirrors the message onto
    /// the firehose, and delivers it to the put-channel. Suspends when the
    /// put-channel is full; sliding out-channels never block.
    ///
    /// Never fails: after shutdown the message is logged and dropped. A
    /// closed component is the only condition under which an emit can go
    /// missing.
    pub async fn emit(&self, msg: Msg) {
        if self.closed.load(Ordering::Acquire) {
            warn!(
                cmp_id = %self.cmp_id,
                msg_type = %msg.msg_type,
                "emit after shutdown, dropping message"
            );
            return;
        }

        let mut msg = msg;
        msg.meta.corr_id = Some(CorrId::new());
        if msg.meta.tag.is_none() {
            msg.meta.tag = Some(MsgTag::new());
        }
        msg.meta.record_step(&self.cmp_id, Direction::Out);
        msg.meta.stamp_out(&self.cmp_id);

        if msg.is_firehose() {
            // Relay traffic: goes onto the firehose verbatim, regardless of
            // the envelope flags.
            self.firehose.forward(msg.clone()).await;
        } else {
            self.firehose.cmp_put(&msg).await;
        }

        if self.put_tx.send(msg).await.is_err() {
            warn!(cmp_id = %self.cmp_id, "put-channel closed, dropping message");
        }
    }
}

//! Firehose envelope publication.
//!
//! The firehose is a secondary outbound stream that mirrors everything a
//! component does: every ordinary message it receives or emits and every
//! state snapshot it publishes, each wrapped in an envelope naming the
//! component and the moment.
//!
//! Envelope kinds (all in the reserved `firehose` namespace):
//!
//! | type | when | payload |
//! |------|------|---------|
//! | `cmp-recv` | ordered input received | `{cmp-id, msg, msg-meta, ts}` |
//! | `cmp-recv-state` | sliding input received | `{cmp-id, msg}` |
//! | `cmp-put` | message emitted | `{cmp-id, msg, msg-meta, ts}` |
//! | `cmp-publish-state` | snapshot published | `{cmp-id, snapshot, ts}` |
//!
//! Messages that are *already* firehose traffic are never wrapped again;
//! relays forward them verbatim via [`Firehose::forward`]. That forward is
//! independent of the `msgs_on_firehose` flag - the flag only gates
//! envelope wrapping, which is why a relay must run with it off to avoid
//! feeding its own envelopes back to itself.

use crate::channel::MsgSender;
use patchbay_msg::{epoch_millis, reserved, CmpId, Msg};
use serde_json::{json, Value};
use tracing::warn;

/// Shared handle for publishing onto a component's firehose channel.
#[derive(Debug, Clone)]
pub(crate) struct Firehose {
    cmp_id: CmpId,
    tx: MsgSender,
    msgs_on_firehose: bool,
    snapshots_on_firehose: bool,
}

impl Firehose {
    pub(crate) fn new(
        cmp_id: CmpId,
        tx: MsgSender,
        msgs_on_firehose: bool,
        snapshots_on_firehose: bool,
    ) -> Self {
        Self {
            cmp_id,
            tx,
            msgs_on_firehose,
            snapshots_on_firehose,
        }
    }

    /// Forwards a firehose-namespace message verbatim (relay path).
    pub(crate) async fn forward(&self, msg: Msg) {
        if self.tx.send(msg).await.is_err() {
            warn!(cmp_id = %self.cmp_id, "firehose closed, dropping forwarded message");
        }
    }

    /// Publishes a `cmp-put` envelope for an emitted message.
    pub(crate) async fn cmp_put(&self, msg: &Msg) {
        if !self.msgs_on_firehose || msg.is_firehose() {
            return;
        }
        self.publish(reserved::cmp_put(), self.msg_envelope(msg)).await;
    }

    /// Publishes a `cmp-recv` envelope for a received ordered message.
    pub(crate) async fn cmp_recv(&self, msg: &Msg) {
        if !self.msgs_on_firehose || msg.is_firehose() {
            return;
        }
        self.publish(reserved::cmp_recv(), self.msg_envelope(msg)).await;
    }

    /// Publishes a `cmp-recv-state` envelope for a received sliding message.
    pub(crate) async fn cmp_recv_state(&self, msg: &Msg) {
        if !self.snapshots_on_firehose || msg.is_firehose() {
            return;
        }
        let envelope = json!({
            "cmp-id": self.cmp_id.as_str(),
            "msg": {
                "type": msg.msg_type.to_string(),
                "payload": msg.payload.clone(),
            },
        });
        self.publish(reserved::cmp_recv_state(), envelope).await;
    }

    /// Publishes a `cmp-publish-state` envelope for a published snapshot.
    pub(crate) async fn cmp_publish_state(&self, snapshot: &Value) {
        if !self.snapshots_on_firehose {
            return;
        }
        let envelope = json!({
            "cmp-id": self.cmp_id.as_str(),
            "snapshot": snapshot,
            "ts": epoch_millis(),
        });
        self.publish(reserved::cmp_publish_state(), envelope).await;
    }

    fn msg_envelope(&self, msg: &Msg) -> Value {
        json!({
            "cmp-id": self.cmp_id.as_str(),
            "msg": {
                "type": msg.msg_type.to_string(),
                "payload": msg.payload.clone(),
            },
            "msg-meta": serde_json::to_value(&msg.meta).unwrap_or(Value::Null),
            "ts": epoch_millis(),
        })
    }

    async fn publish(&self, msg_type: patchbay_msg::MsgType, envelope: Value) {
        if self.tx.send(Msg::new(msg_type, envelope)).await.is_err() {
            warn!(cmp_id = %self.cmp_id, "firehose closed, dropping envelope");
        }
    }
}

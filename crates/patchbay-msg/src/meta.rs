//! Out-of-band message metadata.
//!
//! Every message carries a [`MsgMeta`] record that the runtime rewrites as
//! the message flows:
//!
//! ```text
//!           emit (out)                    receive (in)
//!  ┌────────────────────────┐    ┌───────────────────────────┐
//!  │ fresh corr_id           │    │ append cmp_id to cmp_seq  │
//!  │ tag if absent           │    │ stamp in_ts               │
//!  │ append cmp_id if seq    │    │                           │
//!  │   empty, stamp out_ts   │    │                           │
//!  └────────────────────────┘    └───────────────────────────┘
//! ```
//!
//! Invariants:
//!
//! - `corr_id` differs on every emit, including forwarding
//! - `tag` is preserved across forwarding
//! - a component ID never appears twice consecutively in `cmp_seq`

use crate::id::{CmpId, CorrId, MsgTag};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which side of a component a metadata update happens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The message is being received on an input channel.
    In,
    /// The message is being emitted.
    Out,
}

/// Per-component receive/send timestamps, epoch milliseconds.
///
/// Wall-clock time; not required to be monotonic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// When the component received the message.
    pub in_ts: Option<i64>,
    /// When the component emitted the message.
    pub out_ts: Option<i64>,
}

/// Metadata attached to every message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgMeta {
    /// Ordered sequence of component IDs the message has traversed.
    pub cmp_seq: Vec<CmpId>,
    /// Per-emit unique identifier. Assigned fresh on every emit.
    pub corr_id: Option<CorrId>,
    /// Stable logical-message identifier. Assigned on first emit if absent.
    pub tag: Option<MsgTag>,
    /// Per-component timing stamps, keyed by component ID.
    pub timings: HashMap<CmpId, Timing>,
    /// Originating component for state-snapshot messages.
    pub from: Option<CmpId>,
}

impl MsgMeta {
    /// Records a traversal step for `cmp_id`.
    ///
    /// The ID is appended when the sequence is empty (initial send) or the
    /// direction is [`In`](Direction::In) (inbound reception). Forwarding an
    /// already-sequenced message back out leaves the sequence unchanged, and
    /// an ID equal to the current tail is never appended again, so no
    /// consecutive duplicates can appear.
    pub fn record_step(&mut self, cmp_id: &CmpId, direction: Direction) {
        let should_append = self.cmp_seq.is_empty() || direction == Direction::In;
        if should_append && self.cmp_seq.last() != Some(cmp_id) {
            self.cmp_seq.push(cmp_id.clone());
        }
    }

    /// Stamps the receive time for `cmp_id`.
    pub fn stamp_in(&mut self, cmp_id: &CmpId) {
        self.timings.entry(cmp_id.clone()).or_default().in_ts = Some(epoch_millis());
    }

    /// Stamps the send time for `cmp_id`.
    pub fn stamp_out(&mut self, cmp_id: &CmpId) {
        self.timings.entry(cmp_id.clone()).or_default().out_ts = Some(epoch_millis());
    }

    /// Returns the timing record for `cmp_id`, if any.
    #[must_use]
    pub fn timing(&self, cmp_id: &CmpId) -> Option<&Timing> {
        self.timings.get(cmp_id)
    }
}

/// Current wall-clock time as milliseconds since the Unix epoch.
#[must_use]
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

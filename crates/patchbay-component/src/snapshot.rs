//! Snapshot publication and change detection.
//!
//! A component's state is private; what the rest of the system sees is a
//! *snapshot*: the watched projection of the state, run through an
//! optional caller-supplied transform, published as an `app/state` message
//! on the sliding-out channel.
//!
//! ```text
//!  StateCell ──watch──► Value ──snapshot_xform──► snapshot
//!                                                    │
//!                     sliding-out (latest-only) ◄────┤
//!                     firehose cmp-publish-state ◄───┘
//! ```
//!
//! Because the sliding-out channel retains only the latest value,
//! intermediate snapshots may be discarded; subscribers always see the
//! most recent one.
//!
//! # Change Detection
//!
//! The change task subscribes to the state cell. Every mutation raises a
//! notify flag; the task wakes, compares the current snapshot with the
//! last one it published, and publishes only on a real change. After the
//! last mutation at least one snapshot is eventually published.

use crate::channel::MsgSender;
use crate::firehose::Firehose;
use patchbay_msg::{reserved, CmpId, Msg};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

/// Closure reading the watched projection of a component's state.
pub(crate) type WatchedFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Closure transforming a watched value into a publishable snapshot.
pub(crate) type XformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Publishes state snapshots on a component's sliding-out channel.
///
/// Cheap to clone; handlers receive one in their context and can trigger
/// publication directly, which is also how the builtin
/// `cmd/publish-state` message is served.
#[derive(Clone)]
pub struct SnapshotPublisher {
    cmp_id: CmpId,
    sliding_out_tx: MsgSender,
    firehose: Firehose,
    watched: WatchedFn,
    xform: XformFn,
}

impl std::fmt::Debug for SnapshotPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotPublisher")
            .field("cmp_id", &self.cmp_id)
            .finish_non_exhaustive()
    }
}

impl SnapshotPublisher {
    pub(crate) fn new(
        cmp_id: CmpId,
        sliding_out_tx: MsgSender,
        firehose: Firehose,
        watched: WatchedFn,
        xform: XformFn,
    ) -> Self {
        Self {
            cmp_id,
            sliding_out_tx,
            firehose,
            watched,
            xform,
        }
    }

    /// Returns the current snapshot without publishing it.
    ///
    /// This is the read-only state accessor exposed on the component
    /// record.
    #[must_use]
    pub fn current(&self) -> Value {
        (self.xform)((self.watched)())
    }

    /// Publishes the current snapshot.
    ///
    /// Sends `(app/state, snapshot)` with metadata `{from: cmp-id}` on the
    /// sliding-out channel (never blocks), then mirrors it to the firehose
    /// if snapshot envelopes are enabled. Returns the published snapshot.
    pub async fn publish(&self) -> Value {
        let snapshot = self.current();

        let mut msg = Msg::new(reserved::app_state(), snapshot.clone());
        msg.meta.from = Some(self.cmp_id.clone());
        if self.sliding_out_tx.send(msg).await.is_err() {
            warn!(cmp_id = %self.cmp_id, "sliding-out closed, dropping snapshot");
        }

        self.firehose.cmp_publish_state(&snapshot).await;
        snapshot
    }
}

/// Spawns the change-detection task for a component.
///
/// `dirty` is raised by the state-cell watcher on every mutation. The
/// task seeds its change tracking with the snapshot at spawn time (the
/// initial value is published by the system-ready hook, not here).
pub(crate) fn spawn_change_task(
    publisher: SnapshotPublisher,
    dirty: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let mut last_published = publisher.current();
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = dirty.notified() => {
                    let current = publisher.current();
                    if current != last_published {
                        publisher.publish().await;
                        last_published = current;
                    }
                }
            }
        }
        debug!(cmp_id = %publisher.cmp_id, "change task stopped");
    });
}

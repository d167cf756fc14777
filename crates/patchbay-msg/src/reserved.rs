//! Message types consumed or produced by the runtime itself.
//!
//! | Type | Channel | Meaning |
//! |------|---------|---------|
//! | `cmd/get-state` | in | request a state snapshot; replied to with `state/snapshot` |
//! | `cmd/publish-state` | in | trigger a snapshot publication on sliding-out |
//! | `state/snapshot` | out | `{cmp-id, snapshot}` reply to `cmd/get-state` |
//! | `app/state` | sliding-out | the snapshot itself, metadata `{from: cmp-id}` |
//! | `firehose/cmp-recv` | firehose | envelope for an ordinary received message |
//! | `firehose/cmp-recv-state` | firehose | envelope for a received state snapshot |
//! | `firehose/cmp-put` | firehose | envelope for an emitted message |
//! | `firehose/cmp-publish-state` | firehose | envelope for a published snapshot |
//!
//! The `firehose` domain is reserved; user messages must not use it
//! (see [`MsgType::user`]).

use crate::msg::MsgType;

/// `cmd/get-state` - request for a state snapshot.
#[must_use]
pub fn get_state() -> MsgType {
    MsgType::new("cmd", "get-state")
}

/// `cmd/publish-state` - trigger a snapshot publication.
#[must_use]
pub fn publish_state() -> MsgType {
    MsgType::new("cmd", "publish-state")
}

/// `state/snapshot` - reply to `cmd/get-state`.
#[must_use]
pub fn state_snapshot() -> MsgType {
    MsgType::new("state", "snapshot")
}

/// `app/state` - a component's published state snapshot.
#[must_use]
pub fn app_state() -> MsgType {
    MsgType::new("app", "state")
}

/// `firehose/cmp-recv` - envelope for an ordinary received message.
#[must_use]
pub fn cmp_recv() -> MsgType {
    MsgType::new(MsgType::FIREHOSE_DOMAIN, "cmp-recv")
}

/// `firehose/cmp-recv-state` - envelope for a received state snapshot.
#[must_use]
pub fn cmp_recv_state() -> MsgType {
    MsgType::new(MsgType::FIREHOSE_DOMAIN, "cmp-recv-state")
}

/// `firehose/cmp-put` - envelope for an emitted message.
#[must_use]
pub fn cmp_put() -> MsgType {
    MsgType::new(MsgType::FIREHOSE_DOMAIN, "cmp-put")
}

/// `firehose/cmp-publish-state` - envelope for a published snapshot.
#[must_use]
pub fn cmp_publish_state() -> MsgType {
    MsgType::new(MsgType::FIREHOSE_DOMAIN, "cmp-publish-state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_types() {
        assert_eq!(format!("{}", get_state()), "cmd/get-state");
        assert_eq!(format!("{}", publish_state()), "cmd/publish-state");
        assert_eq!(format!("{}", state_snapshot()), "state/snapshot");
        assert_eq!(format!("{}", app_state()), "app/state");
    }

    #[test]
    fn firehose_types_are_firehose() {
        for t in [cmp_recv(), cmp_recv_state(), cmp_put(), cmp_publish_state()] {
            assert!(t.is_firehose(), "{t} should be in the firehose namespace");
        }
    }

    #[test]
    fn command_types_are_not_firehose() {
        for t in [get_state(), publish_state(), state_snapshot(), app_state()] {
            assert!(!t.is_firehose(), "{t} should not be in the firehose namespace");
        }
    }
}

//! Identifier types for patchbay messages.
//!
//! Component IDs are caller-chosen stable strings (they name a component
//! across restarts and appear in message metadata). Correlation IDs and
//! message tags are random 128-bit UUIDs, unique without coordination.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a component.
///
/// A component ID is a stable, caller-chosen string such as `"store"` or
/// `"ws-client"`. The runtime appends it to the component sequence of every
/// message the component touches, so it should be unique within a wired
/// system.
///
/// # Example
///
/// ```
/// use patchbay_msg::CmpId;
///
/// let id = CmpId::new("store");
/// assert_eq!(id.as_str(), "store");
/// assert_eq!(format!("{id}"), "store");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CmpId(String);

impl CmpId {
    /// Creates a component ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CmpId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CmpId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for CmpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation identifier for a single emission.
///
/// A fresh `CorrId` is assigned on **every** emit, including when a message
/// is forwarded unchanged. Two sends of the same logical message therefore
/// carry different correlation IDs, which is what distinguishes
/// retransmissions downstream.
///
/// # Example
///
/// ```
/// use patchbay_msg::CorrId;
///
/// let a = CorrId::new();
/// let b = CorrId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - CorrIds are minted by the emitter
impl CorrId {
    /// Creates a new [`CorrId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for CorrId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "corr:{}", self.0)
    }
}

/// Stable identifier of a logical message.
///
/// Assigned on first emit if the message does not already carry one, and
/// never rewritten afterwards. A message forwarded through a chain of
/// components keeps its tag end to end, while the [`CorrId`] changes at
/// every hop.
///
/// # Example
///
/// ```
/// use patchbay_msg::MsgTag;
///
/// let tag = MsgTag::new();
/// assert_eq!(tag.uuid(), tag.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MsgTag(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - tags are minted by the emitter
impl MsgTag {
    /// Creates a new [`MsgTag`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for MsgTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmp_id_roundtrip() {
        let id = CmpId::new("c1");
        assert_eq!(id.as_str(), "c1");
        assert_eq!(CmpId::from("c1"), id);
        assert_eq!(CmpId::from(String::from("c1")), id);
    }

    #[test]
    fn cmp_id_display_is_bare() {
        let id = CmpId::new("ws-client");
        assert_eq!(format!("{id}"), "ws-client");
    }

    #[test]
    fn cmp_id_serializes_as_string() {
        let id = CmpId::new("store");
        let json = serde_json::to_string(&id).expect("serialize CmpId");
        assert_eq!(json, "\"store\"");
    }

    #[test]
    fn corr_id_uniqueness() {
        let a = CorrId::new();
        let b = CorrId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn corr_id_display() {
        let id = CorrId::new();
        let display = format!("{id}");
        assert!(display.starts_with("corr:"));
        assert!(display.contains(&id.uuid().to_string()));
    }

    #[test]
    fn msg_tag_uniqueness() {
        let a = MsgTag::new();
        let b = MsgTag::new();
        assert_ne!(a, b);
    }

    #[test]
    fn msg_tag_display() {
        let tag = MsgTag::new();
        let display = format!("{tag}");
        assert!(display.starts_with("tag:"));
    }
}

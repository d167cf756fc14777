//! Message type tags and the message record.
//!
//! A message is an ordered pair of type and payload, plus out-of-band
//! metadata (see [`MsgMeta`](crate::MsgMeta)). The type is a namespaced
//! symbolic tag written `domain/name`, e.g. `cmd/get-state` or `ping/req`.
//!
//! The `firehose` domain is reserved for observability envelopes produced
//! by the runtime; user messages must not use it.

use crate::error::MsgError;
use crate::meta::MsgMeta;
use crate::MsgTag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Namespaced message type tag.
///
/// Handler registries are keyed on this type; the topic publisher
/// partitions a component's output stream by it.
///
/// # Example
///
/// ```
/// use patchbay_msg::MsgType;
///
/// let t = MsgType::new("ping", "req");
/// assert_eq!(format!("{t}"), "ping/req");
/// assert!(!t.is_firehose());
///
/// let parsed: MsgType = "ping/req".parse().expect("valid type");
/// assert_eq!(parsed, t);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MsgType {
    /// Namespace, e.g. `cmd`, `state`, `firehose`.
    pub domain: String,
    /// Name within the namespace.
    pub name: String,
}

impl MsgType {
    /// Domain reserved for observability envelopes.
    pub const FIREHOSE_DOMAIN: &'static str = "firehose";

    /// Creates a message type from a domain and a name.
    #[must_use]
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// Creates a user message type, rejecting reserved namespaces.
    ///
    /// # Errors
    ///
    /// Returns [`MsgError::ReservedNamespace`] if `domain` is the
    /// `firehose` namespace.
    pub fn user(domain: impl Into<String>, name: impl Into<String>) -> Result<Self, MsgError> {
        let domain = domain.into();
        if domain == Self::FIREHOSE_DOMAIN {
            return Err(MsgError::ReservedNamespace(domain));
        }
        Ok(Self {
            domain,
            name: name.into(),
        })
    }

    /// Returns `true` if this type lies in the reserved `firehose` namespace.
    #[must_use]
    pub fn is_firehose(&self) -> bool {
        self.domain == Self::FIREHOSE_DOMAIN
    }

    /// Checks whether this type matches the given domain and name.
    #[must_use]
    pub fn matches(&self, domain: &str, name: &str) -> bool {
        self.domain == domain && self.name == name
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.domain, self.name)
    }
}

impl FromStr for MsgType {
    type Err = MsgError;

    /// Parses `domain/name`. Exactly one `/`, both parts non-empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((domain, name))
                if !domain.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(domain, name))
            }
            _ => Err(MsgError::InvalidType(s.to_string())),
        }
    }
}

/// A message: type, payload, and attached metadata.
///
/// The payload is opaque JSON. Within a process it may be any
/// [`Value`]; that is also the representation that crosses transport
/// boundaries, so nothing extra is needed for serialization.
///
/// Metadata travels out of band - it is never merged into the payload.
///
/// # Example
///
/// ```
/// use patchbay_msg::{Msg, MsgType};
/// use serde_json::json;
///
/// let msg = Msg::new(MsgType::new("ping", "req"), json!({"n": 1}));
/// assert_eq!(msg.payload["n"], 1);
/// assert!(msg.meta.corr_id.is_none()); // assigned on emit, not construction
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Msg {
    /// Namespaced type tag.
    pub msg_type: MsgType,
    /// Opaque payload.
    pub payload: Value,
    /// Out-of-band metadata.
    pub meta: MsgMeta,
}

impl Msg {
    /// Creates a message with empty metadata.
    ///
    /// Correlation ID, tag, sequence, and timestamps are filled in by the
    /// runtime as the message flows.
    #[must_use]
    pub fn new(msg_type: MsgType, payload: Value) -> Self {
        Self {
            msg_type,
            payload,
            meta: MsgMeta::default(),
        }
    }

    /// Sets a caller-supplied tag.
    ///
    /// The emitter honours a pre-set tag and will not overwrite it; this is
    /// how a logical message keeps its identity when a reply references an
    /// earlier exchange.
    #[must_use]
    pub fn with_tag(mut self, tag: MsgTag) -> Self {
        self.meta.tag = Some(tag);
        self
    }

    /// Returns `true` if the message type lies in the `firehose` namespace.
    #[must_use]
    pub fn is_firehose(&self) -> bool {
        self.msg_type.is_firehose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn msg_type_display() {
        let t = MsgType::new("cmd", "get-state");
        assert_eq!(format!("{t}"), "cmd/get-state");
    }

    #[test]
    fn msg_type_parse_valid() {
        let t: MsgType = "state/snapshot".parse().expect("valid");
        assert_eq!(t.domain, "state");
        assert_eq!(t.name, "snapshot");
    }

    #[test]
    fn msg_type_parse_invalid() {
        assert!("nodomain".parse::<MsgType>().is_err());
        assert!("/name".parse::<MsgType>().is_err());
        assert!("domain/".parse::<MsgType>().is_err());
        assert!("a/b/c".parse::<MsgType>().is_err());
        assert!("".parse::<MsgType>().is_err());
    }

    #[test]
    fn msg_type_firehose_predicate() {
        assert!(MsgType::new("firehose", "cmp-put").is_firehose());
        assert!(!MsgType::new("cmd", "get-state").is_firehose());
    }

    #[test]
    fn msg_type_user_rejects_firehose() {
        assert!(MsgType::user("firehose", "spoof").is_err());
        assert!(MsgType::user("ping", "req").is_ok());
    }

    #[test]
    fn msg_type_matches() {
        let t = MsgType::new("ping", "req");
        assert!(t.matches("ping", "req"));
        assert!(!t.matches("ping", "res"));
        assert!(!t.matches("pong", "req"));
    }

    #[test]
    fn msg_construction() {
        let msg = Msg::new(MsgType::new("foo", "bar"), json!({"x": 1}));
        assert_eq!(msg.payload["x"], 1);
        assert!(msg.meta.cmp_seq.is_empty());
        assert!(msg.meta.corr_id.is_none());
        assert!(msg.meta.tag.is_none());
    }

    #[test]
    fn msg_with_tag() {
        let tag = crate::MsgTag::new();
        let msg = Msg::new(MsgType::new("foo", "bar"), Value::Null).with_tag(tag);
        assert_eq!(msg.meta.tag, Some(tag));
    }

    #[test]
    fn msg_serde_roundtrip() {
        let msg = Msg::new(MsgType::new("foo", "bar"), json!({"x": [1, 2]}));
        let json = serde_json::to_string(&msg).expect("serialize Msg");
        let back: Msg = serde_json::from_str(&json).expect("deserialize Msg");
        assert_eq!(back, msg);
    }
}

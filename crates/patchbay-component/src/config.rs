//! Component configuration: buffer specs and runtime options.
//!
//! Every channel a component owns is described by a [`BufferSpec`]:
//!
//! - **fifo** buffers preserve order and block the producer at capacity
//! - **sliding** buffers retain only the latest N values; the oldest is
//!   dropped on overflow and the producer never blocks
//!
//! [`ComponentConfig`] collects the buffer specs for all five channels plus
//! the behavioural flags. Defaults follow the principle of smallest useful
//! buffers: every channel holds a single element unless configured
//! otherwise.

use crate::error::ComponentError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Buffer spec for one channel.
///
/// Serializes as a tagged pair, e.g. `{"buffer": 8}` or `{"sliding": 1}`.
///
/// # Example
///
/// ```
/// use patchbay_component::BufferSpec;
///
/// let fifo = BufferSpec::Fifo(8);
/// assert_eq!(fifo.capacity(), 8);
/// assert!(!fifo.is_sliding());
///
/// let sliding = BufferSpec::Sliding(1);
/// assert!(sliding.is_sliding());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferSpec {
    /// Bounded FIFO buffer. Blocks the producer when full.
    #[serde(rename = "buffer")]
    Fifo(usize),
    /// Sliding buffer. Drops the oldest element to make room; the producer
    /// never blocks.
    Sliding(usize),
}

impl BufferSpec {
    /// Returns the buffer capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        match self {
            Self::Fifo(n) | Self::Sliding(n) => *n,
        }
    }

    /// Returns `true` for sliding buffers.
    #[must_use]
    pub const fn is_sliding(&self) -> bool {
        matches!(self, Self::Sliding(_))
    }

    /// Validates the spec.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidBuffer`] for a zero capacity -
    /// neither buffer kind can hold nothing.
    pub fn validate(&self) -> Result<(), ComponentError> {
        if self.capacity() == 0 {
            return Err(ComponentError::InvalidBuffer(format!(
                "{self:?}: capacity must be > 0"
            )));
        }
        Ok(())
    }
}

/// Configuration for a component.
///
/// | option | meaning | default |
/// |--------|---------|---------|
/// | `in_chan` | buffer for ordered input | fifo 1 |
/// | `sliding_in_chan` | buffer for latest-only input | sliding 1 |
/// | `out_chan` | buffer for ordered output (and the internal put-channel) | fifo 1 |
/// | `sliding_out_chan` | buffer for snapshot output | sliding 1 |
/// | `firehose_chan` | buffer for the observability stream | fifo 1 |
/// | `throttle_ms` | minimum delay between sliding-in handler invocations | 1 |
/// | `msgs_on_firehose` | emit firehose envelopes for ordinary messages | true |
/// | `snapshots_on_firehose` | emit firehose envelopes for state snapshots | true |
/// | `reload_cmp` | development flag, honoured by the switchboard | true |
///
/// # Example
///
/// ```
/// use patchbay_component::{BufferSpec, ComponentConfig};
///
/// let cfg = ComponentConfig::default()
///     .with_in_chan(BufferSpec::Fifo(16))
///     .with_throttle_ms(10);
///
/// assert_eq!(cfg.in_chan.capacity(), 16);
/// assert_eq!(cfg.throttle_ms, 10);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Buffer spec for the ordered input channel.
    pub in_chan: BufferSpec,
    /// Buffer spec for the latest-only input channel.
    pub sliding_in_chan: BufferSpec,
    /// Buffer spec for the ordered output channel and the internal
    /// put-channel that feeds it.
    pub out_chan: BufferSpec,
    /// Buffer spec for the snapshot output channel.
    pub sliding_out_chan: BufferSpec,
    /// Buffer spec for the firehose stream.
    pub firehose_chan: BufferSpec,
    /// Minimum delay in milliseconds between sliding-in handler
    /// invocations. Back-pressures high-rate producers.
    pub throttle_ms: u64,
    /// Wrap ordinary messages in firehose envelopes.
    ///
    /// Relay components that re-emit firehose traffic must set this to
    /// `false`, or they feed their own envelopes back to themselves.
    pub msgs_on_firehose: bool,
    /// Wrap state snapshots in firehose envelopes.
    pub snapshots_on_firehose: bool,
    /// Development flag. Opaque to the component runtime; the switchboard
    /// reads it to decide whether the component is reloaded on code change.
    pub reload_cmp: bool,
}

impl ComponentConfig {
    /// Returns a config with the given ordered-input buffer.
    #[must_use]
    pub const fn with_in_chan(mut self, spec: BufferSpec) -> Self {
        self.in_chan = spec;
        self
    }

    /// Returns a config with the given sliding-input buffer.
    #[must_use]
    pub const fn with_sliding_in_chan(mut self, spec: BufferSpec) -> Self {
        self.sliding_in_chan = spec;
        self
    }

    /// Returns a config with the given ordered-output buffer.
    #[must_use]
    pub const fn with_out_chan(mut self, spec: BufferSpec) -> Self {
        self.out_chan = spec;
        self
    }

    /// Returns a config with the given snapshot-output buffer.
    #[must_use]
    pub const fn with_sliding_out_chan(mut self, spec: BufferSpec) -> Self {
        self.sliding_out_chan = spec;
        self
    }

    /// Returns a config with the given firehose buffer.
    #[must_use]
    pub const fn with_firehose_chan(mut self, spec: BufferSpec) -> Self {
        self.firehose_chan = spec;
        self
    }

    /// Returns a config with the given sliding-input throttle.
    #[must_use]
    pub const fn with_throttle_ms(mut self, ms: u64) -> Self {
        self.throttle_ms = ms;
        self
    }

    /// Returns a config with ordinary-message envelopes switched on or off.
    #[must_use]
    pub const fn with_msgs_on_firehose(mut self, on: bool) -> Self {
        self.msgs_on_firehose = on;
        self
    }

    /// Returns a config with snapshot envelopes switched on or off.
    #[must_use]
    pub const fn with_snapshots_on_firehose(mut self, on: bool) -> Self {
        self.snapshots_on_firehose = on;
        self
    }

    /// Returns a config with the reload flag set.
    #[must_use]
    pub const fn with_reload_cmp(mut self, reload: bool) -> Self {
        self.reload_cmp = reload;
        self
    }

    /// Returns the sliding-input throttle as a [`Duration`].
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Validates every buffer spec.
    ///
    /// # Errors
    ///
    /// Returns the first [`ComponentError::InvalidBuffer`] encountered.
    /// Called by the component factory; a failing config aborts
    /// construction before any task is spawned.
    pub fn validate(&self) -> Result<(), ComponentError> {
        self.in_chan.validate()?;
        self.sliding_in_chan.validate()?;
        self.out_chan.validate()?;
        self.sliding_out_chan.validate()?;
        self.firehose_chan.validate()?;
        Ok(())
    }
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            in_chan: BufferSpec::Fifo(1),
            sliding_in_chan: BufferSpec::Sliding(1),
            out_chan: BufferSpec::Fifo(1),
            sliding_out_chan: BufferSpec::Sliding(1),
            firehose_chan: BufferSpec::Fifo(1),
            throttle_ms: 1,
            msgs_on_firehose: true,
            snapshots_on_firehose: true,
            reload_cmp: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_spec_capacity() {
        assert_eq!(BufferSpec::Fifo(4).capacity(), 4);
        assert_eq!(BufferSpec::Sliding(2).capacity(), 2);
    }

    #[test]
    fn buffer_spec_zero_capacity_invalid() {
        assert!(BufferSpec::Fifo(0).validate().is_err());
        assert!(BufferSpec::Sliding(0).validate().is_err());
        assert!(BufferSpec::Fifo(1).validate().is_ok());
    }

    #[test]
    fn buffer_spec_serde_shape() {
        let json = serde_json::to_string(&BufferSpec::Fifo(8)).expect("serialize");
        assert_eq!(json, r#"{"buffer":8}"#);

        let json = serde_json::to_string(&BufferSpec::Sliding(1)).expect("serialize");
        assert_eq!(json, r#"{"sliding":1}"#);

        let spec: BufferSpec = serde_json::from_str(r#"{"buffer":3}"#).expect("deserialize");
        assert_eq!(spec, BufferSpec::Fifo(3));
    }

    #[test]
    fn config_defaults() {
        let cfg = ComponentConfig::default();
        assert_eq!(cfg.in_chan, BufferSpec::Fifo(1));
        assert_eq!(cfg.sliding_in_chan, BufferSpec::Sliding(1));
        assert_eq!(cfg.out_chan, BufferSpec::Fifo(1));
        assert_eq!(cfg.sliding_out_chan, BufferSpec::Sliding(1));
        assert_eq!(cfg.firehose_chan, BufferSpec::Fifo(1));
        assert_eq!(cfg.throttle_ms, 1);
        assert!(cfg.msgs_on_firehose);
        assert!(cfg.snapshots_on_firehose);
        assert!(cfg.reload_cmp);
    }

    #[test]
    fn config_builders() {
        let cfg = ComponentConfig::default()
            .with_out_chan(BufferSpec::Fifo(32))
            .with_sliding_in_chan(BufferSpec::Sliding(4))
            .with_msgs_on_firehose(false)
            .with_reload_cmp(false);

        assert_eq!(cfg.out_chan.capacity(), 32);
        assert_eq!(cfg.sliding_in_chan.capacity(), 4);
        assert!(!cfg.msgs_on_firehose);
        assert!(!cfg.reload_cmp);
    }

    #[test]
    fn config_validate_rejects_zero() {
        let cfg = ComponentConfig::default().with_firehose_chan(BufferSpec::Fifo(0));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn throttle_as_duration() {
        let cfg = ComponentConfig::default().with_throttle_ms(25);
        assert_eq!(cfg.throttle(), Duration::from_millis(25));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = ComponentConfig::default().with_out_chan(BufferSpec::Sliding(5));
        let json = serde_json::to_string(&cfg).expect("serialize ComponentConfig");
        let back: ComponentConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, cfg);
    }
}

//! Mult: fan-out over a message channel.
//!
//! A mult consumes a source channel and forwards every message to every
//! tap. Taps are ordinary channels created from a [`BufferSpec`], so a
//! slow fifo tap back-pressures the whole source - that is the point: a
//! mult never silently drops for a subscriber that asked for fifo
//! semantics. Sliding taps absorb bursts instead.
//!
//! ```text
//!                      ┌── tap (fifo 8)  ──► subscriber A
//!  source ──► mult ────┼── tap (sliding) ──► subscriber B
//!                      └── tap (fifo 1)  ──► subscriber C
//! ```
//!
//! With no taps attached, the forwarder still drains the source, so an
//! unobserved output channel never blocks its producer.
//!
//! Dropping a tap's receiver detaches it: the next failed forward prunes
//! the dead sender.

use crate::channel::{channel, MsgReceiver, MsgSender};
use crate::config::BufferSpec;
use crate::error::ComponentError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Fan-out primitive: every tap receives every message.
#[derive(Debug, Clone)]
pub struct Mult {
    taps: Arc<Mutex<Vec<MsgSender>>>,
}

impl Mult {
    /// Creates a mult over `source` and spawns its forwarder task.
    ///
    /// The forwarder runs until the source closes.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(mut source: MsgReceiver) -> Self {
        let taps: Arc<Mutex<Vec<MsgSender>>> = Arc::new(Mutex::new(Vec::new()));

        let registry = Arc::clone(&taps);
        tokio::spawn(async move {
            while let Some(msg) = source.recv().await {
                let current: Vec<MsgSender> = registry.lock().clone();
                let mut any_dead = false;
                for tap in &current {
                    if tap.send(msg.clone()).await.is_err() {
                        any_dead = true;
                    }
                }
                if any_dead {
                    registry.lock().retain(|tap| !tap.is_closed());
                }
            }
            debug!("mult source closed, forwarder stopping");
        });

        Self { taps }
    }

    /// Attaches a tap with the given buffer spec.
    ///
    /// The tap receives every message forwarded after this call; messages
    /// already forwarded are not replayed.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidBuffer`] for a zero capacity.
    pub fn tap(&self, spec: &BufferSpec) -> Result<MsgReceiver, ComponentError> {
        let (tx, rx) = channel(spec)?;
        self.taps.lock().push(tx);
        Ok(rx)
    }

    /// Returns the number of attached taps.
    #[must_use]
    pub fn tap_count(&self) -> usize {
        self.taps.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_msg::{Msg, MsgType};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn msg(n: i64) -> Msg {
        Msg::new(MsgType::new("test", "msg"), json!({ "n": n }))
    }

    async fn recv(rx: &mut MsgReceiver) -> Msg {
        timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("recv timed out")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn every_tap_receives_every_message() {
        let (tx, rx) = channel(&BufferSpec::Fifo(8)).expect("channel");
        let mult = Mult::new(rx);

        let mut a = mult.tap(&BufferSpec::Fifo(8)).expect("tap");
        let mut b = mult.tap(&BufferSpec::Fifo(8)).expect("tap");

        tx.send(msg(1)).await.expect("send");
        tx.send(msg(2)).await.expect("send");

        assert_eq!(recv(&mut a).await.payload["n"], 1);
        assert_eq!(recv(&mut a).await.payload["n"], 2);
        assert_eq!(recv(&mut b).await.payload["n"], 1);
        assert_eq!(recv(&mut b).await.payload["n"], 2);
    }

    #[tokio::test]
    async fn no_taps_drains_source() {
        let (tx, rx) = channel(&BufferSpec::Fifo(1)).expect("channel");
        let _mult = Mult::new(rx);

        // Fifo(1) would block the third send if the mult did not drain.
        for n in 0..3 {
            timeout(Duration::from_millis(500), tx.send(msg(n)))
                .await
                .expect("send should not block")
                .expect("send");
        }
    }

    #[tokio::test]
    async fn dead_tap_is_pruned() {
        let (tx, rx) = channel(&BufferSpec::Fifo(8)).expect("channel");
        let mult = Mult::new(rx);

        let dead = mult.tap(&BufferSpec::Fifo(1)).expect("tap");
        let mut live = mult.tap(&BufferSpec::Fifo(8)).expect("tap");
        drop(dead);

        tx.send(msg(1)).await.expect("send");
        assert_eq!(recv(&mut live).await.payload["n"], 1);

        // The failed forward pruned the dropped tap.
        tx.send(msg(2)).await.expect("send");
        assert_eq!(recv(&mut live).await.payload["n"], 2);
        assert_eq!(mult.tap_count(), 1);
    }

    #[tokio::test]
    async fn sliding_tap_keeps_latest() {
        let (tx, rx) = channel(&BufferSpec::Fifo(8)).expect("channel");
        let mult = Mult::new(rx);

        let mut tap = mult.tap(&BufferSpec::Sliding(1)).expect("tap");

        for n in 1..=5 {
            tx.send(msg(n)).await.expect("send");
        }

        // Give the forwarder time to push all five into the sliding tap.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(recv(&mut tap).await.payload["n"], 5);
    }
}

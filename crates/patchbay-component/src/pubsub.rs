//! Pub: a mult partitioned by message type.
//!
//! A pub consumes a source channel and routes each message to the
//! subscribers of its [`MsgType`]. Messages with no subscriber are
//! dropped - the switchboard subscribes components only to the types
//! they declare an interest in.
//!
//! ```text
//!                        ping/req ──► subscriber A
//!  source ──► pub ───┤
//!                        pong/res ──► subscriber B, subscriber C
//! ```
//!
//! Like the mult, subscriber channels are created from a [`BufferSpec`],
//! so a slow fifo subscriber back-pressures the source for its type.

use crate::channel::{channel, MsgReceiver, MsgSender};
use crate::config::BufferSpec;
use crate::error::ComponentError;
use parking_lot::Mutex;
use patchbay_msg::MsgType;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Topic publisher keyed on message type.
#[derive(Debug, Clone)]
pub struct Pub {
    subs: Arc<Mutex<HashMap<MsgType, Vec<MsgSender>>>>,
}

impl Pub {
    /// Creates a pub over `source` and spawns its router task.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(mut source: MsgReceiver) -> Self {
        let subs: Arc<Mutex<HashMap<MsgType, Vec<MsgSender>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let registry = Arc::clone(&subs);
        tokio::spawn(async move {
            while let Some(msg) = source.recv().await {
                let current: Vec<MsgSender> = registry
                    .lock()
                    .get(&msg.msg_type)
                    .cloned()
                    .unwrap_or_default();
                if current.is_empty() {
                    continue;
                }
                let mut any_dead = false;
                for sub in &current {
                    if sub.send(msg.clone()).await.is_err() {
                        any_dead = true;
                    }
                }
                if any_dead {
                    let mut map = registry.lock();
                    if let Some(list) = map.get_mut(&msg.msg_type) {
                        list.retain(|sub| !sub.is_closed());
                        if list.is_empty() {
                            map.remove(&msg.msg_type);
                        }
                    }
                }
            }
            debug!("pub source closed, router stopping");
        });

        Self { subs }
    }

    /// Subscribes to one message type with the given buffer spec.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidBuffer`] for a zero capacity.
    pub fn sub(
        &self,
        msg_type: MsgType,
        spec: &BufferSpec,
    ) -> Result<MsgReceiver, ComponentError> {
        let (tx, rx) = channel(spec)?;
        self.subs.lock().entry(msg_type).or_default().push(tx);
        Ok(rx)
    }

    /// Returns the number of subscribed message types.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.subs.lock().len()
    }
}

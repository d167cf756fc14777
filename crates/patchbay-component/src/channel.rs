//! Message channels and the channel factory.
//!
//! A channel is created from a [`BufferSpec`]:
//!
//! - **fifo**: a bounded [`tokio::sync::mpsc`] channel. Order-preserving;
//!   `send` suspends when the buffer is full.
//! - **sliding**: a ring of the latest N messages behind a mutex, with a
//!   [`Notify`] to wake the consumer. On overflow the oldest message is
//!   dropped; `send` never suspends.
//!
//! Both kinds are single-consumer. Senders are cheaply cloneable.
//!
//! # Close Semantics
//!
//! A fifo channel closes when every sender has been dropped or the
//! receiver is dropped (mpsc semantics). A sliding channel closes when
//! [`MsgSender::close`] is called or its receiver is dropped; buffered
//! messages are still drained before `recv` returns `None`.

use crate::config::BufferSpec;
use crate::error::ComponentError;
use parking_lot::Mutex;
use patchbay_msg::Msg;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Notify;

/// Sending half of a message channel.
#[derive(Debug, Clone)]
pub struct MsgSender {
    inner: SenderInner,
}

#[derive(Debug, Clone)]
enum SenderInner {
    Fifo(mpsc::Sender<Msg>),
    Sliding(Arc<Sliding>),
}

/// Receiving half of a message channel. Single consumer.
#[derive(Debug)]
pub struct MsgReceiver {
    inner: ReceiverInner,
}

#[derive(Debug)]
enum ReceiverInner {
    Fifo(mpsc::Receiver<Msg>),
    Sliding(SlidingReceiver),
}

/// Creates a channel from a buffer spec.
///
/// # Errors
///
/// Returns [`ComponentError::InvalidBuffer`] for a zero capacity.
pub fn channel(spec: &BufferSpec) -> Result<(MsgSender, MsgReceiver), ComponentError> {
    spec.validate()?;
    match spec {
        BufferSpec::Fifo(n) => {
            let (tx, rx) = mpsc::channel(*n);
            Ok((
                MsgSender {
                    inner: SenderInner::Fifo(tx),
                },
                MsgReceiver {
                    inner: ReceiverInner::Fifo(rx),
                },
            ))
        }
        BufferSpec::Sliding(n) => {
            let chan = Arc::new(Sliding::new(*n));
            Ok((
                MsgSender {
                    inner: SenderInner::Sliding(Arc::clone(&chan)),
                },
                MsgReceiver {
                    inner: ReceiverInner::Sliding(SlidingReceiver { chan }),
                },
            ))
        }
    }
}

impl MsgSender {
    /// Sends a message.
    ///
    /// Fifo channels suspend when the buffer is full; sliding channels
    /// drop their oldest buffered message instead and return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::ChannelClosed`] if the channel is closed.
    pub async fn send(&self, msg: Msg) -> Result<(), ComponentError> {
        match &self.inner {
            SenderInner::Fifo(tx) => tx
                .send(msg)
                .await
                .map_err(|_| ComponentError::ChannelClosed),
            SenderInner::Sliding(chan) => chan.push(msg),
        }
    }

    /// Returns `true` if the channel can no longer accept messages.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match &self.inner {
            SenderInner::Fifo(tx) => tx.is_closed(),
            SenderInner::Sliding(chan) => chan.is_closed(),
        }
    }

    /// Closes the channel.
    ///
    /// Sliding channels reject further sends; buffered messages remain
    /// receivable. Fifo channels have no sender-side close (they close
    /// when all senders drop), so this is a no-op for them.
    pub fn close(&self) {
        if let SenderInner::Sliding(chan) = &self.inner {
            chan.close();
        }
    }
}

impl MsgReceiver {
    /// Receives the next message.
    ///
    /// Suspends until a message is available. Returns `None` once the
    /// channel is closed and drained.
    pub async fn recv(&mut self) -> Option<Msg> {
        match &mut self.inner {
            ReceiverInner::Fifo(rx) => rx.recv().await,
            ReceiverInner::Sliding(rx) => rx.chan.pop().await,
        }
    }
}

/// Sliding channel internals: a bounded ring plus a consumer wakeup.
#[derive(Debug)]
struct Sliding {
    queue: Mutex<SlidingQueue>,
    notify: Notify,
}

#[derive(Debug)]
struct SlidingQueue {
    buf: VecDeque<Msg>,
    capacity: usize,
    closed: bool,
}

impl Sliding {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(SlidingQueue {
                buf: VecDeque::with_capacity(capacity),
                capacity,
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Non-suspending push; evicts the oldest message at capacity.
    fn push(&self, msg: Msg) -> Result<(), ComponentError> {
        {
            let mut q = self.queue.lock();
            if q.closed {
                return Err(ComponentError::ChannelClosed);
            }
            if q.buf.len() >= q.capacity {
                q.buf.pop_front();
            }
            q.buf.push_back(msg);
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self) -> Option<Msg> {
        loop {
            // Register for a wakeup before checking the queue, so a push
            // between the check and the await is not missed.
            let notified = self.notify.notified();
            {
                let mut q = self.queue.lock();
                if let Some(msg) = q.buf.pop_front() {
                    return Some(msg);
                }
                if q.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    fn close(&self) {
        self.queue.lock().closed = true;
        self.notify.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.queue.lock().closed
    }
}

/// Wrapper that closes the sliding channel when the consumer goes away,
/// so senders observe the closure instead of filling a dead ring.
#[derive(Debug)]
struct SlidingReceiver {
    chan: Arc<Sliding>,
}

impl Drop for SlidingReceiver {
    fn drop(&mut self) {
        self.chan.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_msg::{Msg, MsgType};
    use serde_json::json;

    fn msg(n: i64) -> Msg {
        Msg::new(MsgType::new("test", "msg"), json!({ "n": n }))
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(channel(&BufferSpec::Fifo(0)).is_err());
        assert!(channel(&BufferSpec::Sliding(0)).is_err());
    }

    #[tokio::test]
    async fn fifo_preserves_order() {
        let (tx, mut rx) = channel(&BufferSpec::Fifo(4)).expect("channel");

        for n in 1..=4 {
            tx.send(msg(n)).await.expect("send");
        }

        for n in 1..=4 {
            let m = rx.recv().await.expect("recv");
            assert_eq!(m.payload["n"], n);
        }
    }

    #[tokio::test]
    async fn fifo_close_on_sender_drop() {
        let (tx, mut rx) = channel(&BufferSpec::Fifo(1)).expect("channel");
        tx.send(msg(1)).await.expect("send");
        drop(tx);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn sliding_drops_oldest() {
        let (tx, mut rx) = channel(&BufferSpec::Sliding(2)).expect("channel");

        for n in 1..=5 {
            tx.send(msg(n)).await.expect("send");
        }

        // Only the latest two survive.
        assert_eq!(rx.recv().await.expect("recv").payload["n"], 4);
        assert_eq!(rx.recv().await.expect("recv").payload["n"], 5);
    }

    #[tokio::test]
    async fn sliding_send_never_blocks() {
        let (tx, _rx) = channel(&BufferSpec::Sliding(1)).expect("channel");

        // Far beyond capacity, without a consumer.
        for n in 0..100 {
            tx.send(msg(n)).await.expect("send");
        }
    }

    #[tokio::test]
    async fn sliding_close_rejects_sends_but_drains() {
        let (tx, mut rx) = channel(&BufferSpec::Sliding(4)).expect("channel");
        tx.send(msg(1)).await.expect("send");
        tx.close();

        assert!(tx.send(msg(2)).await.is_err());
        assert!(tx.is_closed());

        // Buffered message still delivered, then closed.
        assert_eq!(rx.recv().await.expect("recv").payload["n"], 1);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn sliding_receiver_drop_closes() {
        let (tx, rx) = channel(&BufferSpec::Sliding(1)).expect("channel");
        drop(rx);
        assert!(tx.send(msg(1)).await.is_err());
    }

    #[tokio::test]
    async fn sliding_wakes_parked_consumer() {
        let (tx, mut rx) = channel(&BufferSpec::Sliding(1)).expect("channel");

        let consumer = tokio::spawn(async move { rx.recv().await });
        tokio::task::yield_now().await;

        tx.send(msg(7)).await.expect("send");

        let got = consumer.await.expect("join").expect("recv");
        assert_eq!(got.payload["n"], 7);
    }

    #[tokio::test]
    async fn fifo_backpressure_releases_on_recv() {
        let (tx, mut rx) = channel(&BufferSpec::Fifo(1)).expect("channel");
        tx.send(msg(1)).await.expect("send");

        // Second send must wait for the consumer.
        let tx2 = tx.clone();
        let blocked = tokio::spawn(async move { tx2.send(msg(2)).await });
        tokio::task::yield_now().await;
        assert!(!blocked.is_finished());

        assert_eq!(rx.recv().await.expect("recv").payload["n"], 1);
        blocked.await.expect("join").expect("send");
        assert_eq!(rx.recv().await.expect("recv").payload["n"], 2);
    }
}

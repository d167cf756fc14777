//! Component construction, handler loops, and lifecycle.
//!
//! A component is an isolated unit of behaviour: private state, typed
//! message I/O, and nothing shared with the rest of the system except
//! channels.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!  in ─────► │ ordered loop ──┐                             │
//!            │                ├─► handlers ──► emit ──► put │──splice──► out ──► mult ──► pub
//!  sliding ► │ sliding loop ──┘      │                      │
//!    in      │                       ▼                      │
//!            │                  StateCell ──► snapshots     │──► sliding-out ──► mult ──► pub
//!            │                                              │
//!            │  every recv/emit/publish mirrored ──────────►│──► firehose ──► mult
//!            └──────────────────────────────────────────────┘
//! ```
//!
//! # Construction Order
//!
//! The factory builds leaves first to resolve the cyclic references
//! between the emitter, state, publisher, and loops: channels → emitter →
//! state cell → watched projection → snapshot publisher → mult/pub
//! fan-out → change watcher → handler loops. The returned [`Component`]
//! record is immutable except for the state cell.
//!
//! # Startup Handshake
//!
//! Emits performed between construction and [`Component::system_ready`]
//! buffer in the internal put-channel. The system-ready hook (called by
//! the switchboard once wiring is complete) splices the put-channel into
//! the out-channel, releasing the buffered messages in emit order, and
//! publishes the initial state snapshot.
//!
//! # Example
//!
//! ```ignore
//! let cmp = ComponentBuilder::<Value>::new("echo")
//!     .state(json!({"seen": 0}))
//!     .handler(MsgType::new("ping", "req"), |ctx| async move {
//!         ctx.state.swap(|s| s["seen"] = json!(s["seen"].as_i64().unwrap_or(0) + 1));
//!         ctx.emitter
//!             .emit(Msg::new(MsgType::new("pong", "res"), ctx.payload.clone()))
//!             .await;
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let mut replies = cmp.out_pub().sub(MsgType::new("pong", "res"), &BufferSpec::Fifo(8))?;
//! cmp.system_ready().await;
//! ```

use crate::channel::{channel, MsgReceiver, MsgSender};
use crate::config::ComponentConfig;
use crate::emit::Emitter;
use crate::error::ComponentError;
use crate::firehose::Firehose;
use crate::handler::{Handler, HandlerCtx, HandlerRegistry, HandlerResult};
use crate::mult::Mult;
use crate::pubsub::Pub;
use crate::snapshot::{spawn_change_task, SnapshotPublisher, WatchedFn, XformFn};
use crate::state::StateCell;
use parking_lot::Mutex;
use patchbay_msg::{reserved, CmpId, Direction, Msg, MsgType};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info};

type StateFn<S> = Box<dyn FnOnce(Emitter) -> StateInit<S> + Send>;
type ShutdownFn = Box<dyn FnOnce() + Send>;
type WatchProj<S> = Arc<dyn Fn(&S) -> Value + Send + Sync>;

/// What a state initializer returns: the initial state and an optional
/// shutdown closure that releases state-owned resources.
pub struct StateInit<S> {
    state: S,
    shutdown: Option<ShutdownFn>,
}

impl<S> StateInit<S> {
    /// Wraps an initial state with no shutdown closure.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            state,
            shutdown: None,
        }
    }

    /// Attaches a shutdown closure, run once when the component shuts
    /// down.
    #[must_use]
    pub fn with_shutdown(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.shutdown = Some(Box::new(f));
        self
    }
}

impl<S> From<S> for StateInit<S> {
    fn from(state: S) -> Self {
        Self::new(state)
    }
}

/// Builds a [`Component`].
///
/// See the [module docs](self) for the construction order and an example.
pub struct ComponentBuilder<S> {
    cmp_id: CmpId,
    cfg: ComponentConfig,
    state_fn: Option<StateFn<S>>,
    handlers: HashMap<MsgType, Handler<S>>,
    all_msgs: Option<Handler<S>>,
    unhandled: Option<Handler<S>>,
    state_pub: Option<Handler<S>>,
    watch: Option<WatchProj<S>>,
    xform: Option<XformFn>,
}

impl<S> ComponentBuilder<S>
where
    S: Serialize + Default + Send + Sync + 'static,
{
    /// Starts a builder for the component with the given ID.
    #[must_use]
    pub fn new(cmp_id: impl Into<CmpId>) -> Self {
        Self {
            cmp_id: cmp_id.into(),
            cfg: ComponentConfig::default(),
            state_fn: None,
            handlers: HashMap::new(),
            all_msgs: None,
            unhandled: None,
            state_pub: None,
            watch: None,
            xform: None,
        }
    }

    /// Sets the configuration (merged user options over defaults).
    #[must_use]
    pub fn config(mut self, cfg: ComponentConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the initial state directly.
    #[must_use]
    pub fn state(self, state: S) -> Self {
        self.state_fn(move |_| StateInit::new(state))
    }

    /// Sets the state initializer.
    ///
    /// The initializer receives the component's emitter, so state that
    /// owns background resources can emit from them later. It may attach
    /// a shutdown closure via [`StateInit::with_shutdown`].
    #[must_use]
    pub fn state_fn(mut self, f: impl FnOnce(Emitter) -> StateInit<S> + Send + 'static) -> Self {
        self.state_fn = Some(Box::new(f));
        self
    }

    /// Registers a handler for one message type on the ordered input.
    #[must_use]
    pub fn handler<F, Fut>(mut self, msg_type: MsgType, f: F) -> Self
    where
        F: Fn(HandlerCtx<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.insert(msg_type, Handler::new(f));
        self
    }

    /// Registers a catch-all handler, invoked on every ordered message.
    #[must_use]
    pub fn all_msgs_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerCtx<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.all_msgs = Some(Handler::new(f));
        self
    }

    /// Registers a fallback for ordered messages with no registered
    /// handler.
    #[must_use]
    pub fn unhandled_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerCtx<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.unhandled = Some(Handler::new(f));
        self
    }

    /// Registers the state-snapshot handler for the sliding input.
    #[must_use]
    pub fn state_pub_handler<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HandlerCtx<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.state_pub = Some(Handler::new(f));
        self
    }

    /// Sets the watched projection of the state.
    ///
    /// Defaults to serializing the whole state.
    #[must_use]
    pub fn watch(mut self, f: impl Fn(&S) -> Value + Send + Sync + 'static) -> Self {
        self.watch = Some(Arc::new(f));
        self
    }

    /// Sets the snapshot transform applied before publication.
    ///
    /// Defaults to identity.
    #[must_use]
    pub fn snapshot_xform(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.xform = Some(Arc::new(f));
        self
    }

    /// Constructs the component and starts its handler loops.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::InvalidBuffer`] if any buffer spec in the
    /// configuration is invalid. No task is spawned on error.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Result<Component<S>, ComponentError> {
        self.cfg.validate()?;
        let cmp_id = self.cmp_id.clone();
        let cfg = self.cfg;

        // Channels, including the internal put-channel that buffers emits
        // until system-ready. The put-channel shares the out-chan spec.
        let (in_tx, in_rx) = channel(&cfg.in_chan)?;
        let (sliding_in_tx, sliding_in_rx) = channel(&cfg.sliding_in_chan)?;
        let (put_tx, put_rx) = channel(&cfg.out_chan)?;
        let (out_tx, out_rx) = channel(&cfg.out_chan)?;
        let (sliding_out_tx, sliding_out_rx) = channel(&cfg.sliding_out_chan)?;
        let (firehose_tx, firehose_rx) = channel(&cfg.firehose_chan)?;

        let closed = Arc::new(AtomicBool::new(false));
        let firehose = Firehose::new(
            cmp_id.clone(),
            firehose_tx,
            cfg.msgs_on_firehose,
            cfg.snapshots_on_firehose,
        );
        let emitter = Emitter::new(cmp_id.clone(), put_tx, firehose.clone(), Arc::clone(&closed));

        // State initializer runs with the emitter already bound.
        let init = match self.state_fn {
            Some(f) => f(emitter.clone()),
            None => StateInit::new(S::default()),
        };
        let state = StateCell::new(init.state);
        let shutdown_fn = init.shutdown;

        let watch_proj = self
            .watch
            .unwrap_or_else(|| Arc::new(|s: &S| serde_json::to_value(s).unwrap_or(Value::Null)));
        let watched: WatchedFn = {
            let cell = state.clone();
            Arc::new(move || cell.read(|s| watch_proj(s)))
        };
        let xform = self.xform.unwrap_or_else(|| Arc::new(|v| v));

        let publisher = SnapshotPublisher::new(
            cmp_id.clone(),
            sliding_out_tx,
            firehose.clone(),
            watched,
            xform,
        );

        let out_mult = Mult::new(out_rx);
        let out_pub = Pub::new(out_mult.tap(&cfg.out_chan)?);
        let snapshot_mult = Mult::new(sliding_out_rx);
        let snapshot_pub = Pub::new(snapshot_mult.tap(&cfg.sliding_out_chan)?);
        let firehose_mult = Mult::new(firehose_rx);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let dirty = Arc::new(Notify::new());
        {
            let flag = Arc::clone(&dirty);
            state.subscribe(move || flag.notify_one());
        }
        spawn_change_task(publisher.clone(), dirty, shutdown_rx.clone());

        let registry = Arc::new(HandlerRegistry {
            handlers: self.handlers,
            all_msgs: self.all_msgs,
            unhandled: self.unhandled,
            state_pub: self.state_pub,
        });
        let loop_ctx = LoopCtx {
            cmp_id: cmp_id.clone(),
            state: state.clone(),
            publisher: publisher.clone(),
            emitter: emitter.clone(),
            firehose,
            registry,
        };
        spawn_ordered_loop(in_rx, loop_ctx.clone(), shutdown_rx.clone());
        spawn_sliding_loop(sliding_in_rx, loop_ctx, cfg.throttle(), shutdown_rx);

        info!(cmp_id = %cmp_id, "component constructed");

        Ok(Component {
            cmp_id,
            cfg,
            in_tx,
            sliding_in_tx,
            out_mult,
            out_pub,
            snapshot_mult,
            snapshot_pub,
            firehose_mult,
            state,
            publisher,
            emitter,
            splice: Mutex::new(Some((put_rx, out_tx))),
            ready: AtomicBool::new(false),
            closed,
            shutdown_tx,
            shutdown_fn: Mutex::new(shutdown_fn),
        })
    }
}

/// An assembled component.
///
/// Immutable after construction except for the state cell. The accessors
/// are the component's entire surface towards the switchboard: input
/// senders, output fan-outs, and the three lifecycle entry points
/// ([`system_ready`](Self::system_ready), [`shutdown`](Self::shutdown),
/// [`state_snapshot`](Self::state_snapshot)).
pub struct Component<S> {
    cmp_id: CmpId,
    cfg: ComponentConfig,
    in_tx: MsgSender,
    sliding_in_tx: MsgSender,
    out_mult: Mult,
    out_pub: Pub,
    snapshot_mult: Mult,
    snapshot_pub: Pub,
    firehose_mult: Mult,
    state: StateCell<S>,
    publisher: SnapshotPublisher,
    emitter: Emitter,
    splice: Mutex<Option<(MsgReceiver, MsgSender)>>,
    ready: AtomicBool,
    closed: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_fn: Mutex<Option<ShutdownFn>>,
}

impl<S> std::fmt::Debug for Component<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("cmp_id", &self.cmp_id)
            .field("ready", &self.ready.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<S: Send + Sync + 'static> Component<S> {
    /// Returns the component's ID.
    #[must_use]
    pub fn cmp_id(&self) -> &CmpId {
        &self.cmp_id
    }

    /// Returns the effective configuration.
    #[must_use]
    pub fn config(&self) -> &ComponentConfig {
        &self.cfg
    }

    /// Returns a sender for the ordered input channel.
    #[must_use]
    pub fn in_sender(&self) -> MsgSender {
        self.in_tx.clone()
    }

    /// Returns a sender for the sliding input channel.
    #[must_use]
    pub fn sliding_in_sender(&self) -> MsgSender {
        self.sliding_in_tx.clone()
    }

    /// Returns the out-channel fan-out.
    #[must_use]
    pub fn out_mult(&self) -> &Mult {
        &self.out_mult
    }

    /// Returns the out-channel topic publisher, keyed on message type.
    #[must_use]
    pub fn out_pub(&self) -> &Pub {
        &self.out_pub
    }

    /// Returns the sliding-out fan-out carrying state snapshots.
    #[must_use]
    pub fn snapshot_mult(&self) -> &Mult {
        &self.snapshot_mult
    }

    /// Returns the sliding-out topic publisher.
    #[must_use]
    pub fn snapshot_pub(&self) -> &Pub {
        &self.snapshot_pub
    }

    /// Returns the firehose fan-out.
    #[must_use]
    pub fn firehose_mult(&self) -> &Mult {
        &self.firehose_mult
    }

    /// Returns the component's state cell.
    #[must_use]
    pub fn state(&self) -> &StateCell<S> {
        &self.state
    }

    /// Returns the component's emitter.
    #[must_use]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Sends a message on the ordered input channel.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::ChannelClosed`] after shutdown.
    pub async fn send(&self, msg: Msg) -> Result<(), ComponentError> {
        self.in_tx.send(msg).await
    }

    /// Sends a message on the sliding input channel. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::ChannelClosed`] after shutdown.
    pub async fn send_sliding(&self, msg: Msg) -> Result<(), ComponentError> {
        self.sliding_in_tx.send(msg).await
    }

    /// Returns the current state snapshot. Pure read; nothing is
    /// published.
    #[must_use]
    pub fn state_snapshot(&self) -> Value {
        self.publisher.current()
    }

    /// Returns `true` once [`system_ready`](Self::system_ready) has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Marks the component live: splices the put-channel into the
    /// out-channel and publishes the initial state snapshot.
    ///
    /// Called once by the switchboard after all components are wired.
    /// Messages emitted since construction flow out in emit order.
    /// Idempotent; repeat calls do nothing.
    pub async fn system_ready(&self) {
        if self.ready.swap(true, Ordering::AcqRel) {
            return;
        }

        let splice = self.splice.lock().take();
        if let Some((mut put_rx, out_tx)) = splice {
            let cmp_id = self.cmp_id.clone();
            let mut shutdown = self.shutdown_tx.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;

                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }

                        maybe = put_rx.recv() => {
                            match maybe {
                                Some(msg) => {
                                    if out_tx.send(msg).await.is_err() {
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                }
                debug!(cmp_id = %cmp_id, "put-channel splice stopped");
            });
        }

        self.publisher.publish().await;
        info!(cmp_id = %self.cmp_id, "system ready");
    }

    /// Shuts the component down.
    ///
    /// Stops both handler loops, the change task, and the splice task;
    /// further emits are dropped with a log line; the sliding input
    /// rejects new messages; the optional shutdown closure from the state
    /// initializer runs once. Idempotent.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.shutdown_tx.send(true);
        self.sliding_in_tx.close();
        if let Some(f) = self.shutdown_fn.lock().take() {
            f();
        }
        info!(cmp_id = %self.cmp_id, "component shut down");
    }
}

/// Everything a handler loop needs, cloneable per spawn.
struct LoopCtx<S> {
    cmp_id: CmpId,
    state: StateCell<S>,
    publisher: SnapshotPublisher,
    emitter: Emitter,
    firehose: Firehose,
    registry: Arc<HandlerRegistry<S>>,
}

impl<S> Clone for LoopCtx<S> {
    fn clone(&self) -> Self {
        Self {
            cmp_id: self.cmp_id.clone(),
            state: self.state.clone(),
            publisher: self.publisher.clone(),
            emitter: self.emitter.clone(),
            firehose: self.firehose.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

fn spawn_ordered_loop<S: Send + Sync + 'static>(
    mut rx: MsgReceiver,
    ctx: LoopCtx<S>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        debug!(cmp_id = %ctx.cmp_id, "ordered handler loop started");
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                maybe = rx.recv() => {
                    let Some(mut msg) = maybe else { break };
                    msg.meta.record_step(&ctx.cmp_id, Direction::In);
                    msg.meta.stamp_in(&ctx.cmp_id);

                    ctx.firehose.cmp_recv(&msg).await;
                    handle_builtin(&ctx, &msg).await;
                    dispatch(&ctx, &msg).await;
                }
            }
        }
        debug!(cmp_id = %ctx.cmp_id, "ordered handler loop stopped");
    });
}

fn spawn_sliding_loop<S: Send + Sync + 'static>(
    mut rx: MsgReceiver,
    ctx: LoopCtx<S>,
    throttle: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        debug!(cmp_id = %ctx.cmp_id, "sliding handler loop started");
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                maybe = rx.recv() => {
                    let Some(mut msg) = maybe else { break };
                    msg.meta.record_step(&ctx.cmp_id, Direction::In);
                    msg.meta.stamp_in(&ctx.cmp_id);

                    if let Some(handler) = &ctx.registry.state_pub {
                        run_handler(&ctx, handler, &msg).await;
                    }
                    ctx.firehose.cmp_recv_state(&msg).await;

                    // Back-pressures high-rate producers: while the loop
                    // sleeps, the sliding buffer keeps only the latest.
                    tokio::time::sleep(throttle).await;
                }
            }
        }
        debug!(cmp_id = %ctx.cmp_id, "sliding handler loop stopped");
    });
}

/// Serves the builtin command messages on the ordered input.
async fn handle_builtin<S: Send + Sync + 'static>(ctx: &LoopCtx<S>, msg: &Msg) {
    if msg.msg_type == reserved::get_state() {
        let payload = json!({
            "cmp-id": ctx.cmp_id.as_str(),
            "snapshot": ctx.publisher.current(),
        });
        ctx.emitter
            .emit(Msg::new(reserved::state_snapshot(), payload))
            .await;
    } else if msg.msg_type == reserved::publish_state() {
        ctx.publisher.publish().await;
    }
}

/// Type dispatch, unhandled fallback, then the catch-all.
async fn dispatch<S: Send + Sync + 'static>(ctx: &LoopCtx<S>, msg: &Msg) {
    match ctx.registry.handlers.get(&msg.msg_type) {
        Some(handler) => {
            let handler = handler.clone();
            run_handler(ctx, &handler, msg).await;
        }
        None => {
            if let Some(handler) = &ctx.registry.unhandled {
                run_handler(ctx, handler, msg).await;
            }
        }
    }
    if let Some(handler) = &ctx.registry.all_msgs {
        run_handler(ctx, handler, msg).await;
    }
}

/// Runs one handler inside the error boundary.
async fn run_handler<S: Send + Sync + 'static>(ctx: &LoopCtx<S>, handler: &Handler<S>, msg: &Msg) {
    let hctx = HandlerCtx {
        msg: msg.clone(),
        msg_type: msg.msg_type.clone(),
        payload: msg.payload.clone(),
        state: ctx.state.clone(),
        publisher: ctx.publisher.clone(),
        emitter: ctx.emitter.clone(),
    };
    if let Err(err) = handler.call(hctx).await {
        error!(
            cmp_id = %ctx.cmp_id,
            msg_type = %msg.msg_type,
            payload = %msg.payload,
            error = %err,
            "handler failed, continuing with next message"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferSpec;
    use std::time::Duration;
    use tokio::time::timeout;

    fn test_config() -> ComponentConfig {
        ComponentConfig::default()
            .with_in_chan(BufferSpec::Fifo(16))
            .with_out_chan(BufferSpec::Fifo(16))
            .with_firehose_chan(BufferSpec::Fifo(64))
    }

    #[tokio::test]
    async fn build_rejects_invalid_config() {
        let result = ComponentBuilder::<Value>::new("bad")
            .config(ComponentConfig::default().with_in_chan(BufferSpec::Fifo(0)))
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn default_state_is_default() {
        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .build()
            .expect("build");
        assert_eq!(cmp.state_snapshot(), Value::Null);
    }

    #[tokio::test]
    async fn state_fn_receives_emitter() {
        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .state_fn(|emitter| {
                assert_eq!(emitter.cmp_id(), &CmpId::new("c1"));
                StateInit::new(json!({"ok": true}))
            })
            .build()
            .expect("build");
        assert_eq!(cmp.state_snapshot(), json!({"ok": true}));
    }

    #[tokio::test]
    async fn system_ready_is_idempotent() {
        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .state(json!(1))
            .build()
            .expect("build");

        assert!(!cmp.is_ready());
        cmp.system_ready().await;
        assert!(cmp.is_ready());
        cmp.system_ready().await; // no-op
        assert!(cmp.is_ready());
    }

    #[tokio::test]
    async fn shutdown_runs_state_shutdown_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .state_fn(move |_| {
                StateInit::new(json!(null)).with_shutdown(move || {
                    flag.store(true, Ordering::SeqCst);
                })
            })
            .build()
            .expect("build");

        cmp.shutdown();
        assert!(ran.load(Ordering::SeqCst));

        cmp.shutdown(); // idempotent
    }

    #[tokio::test]
    async fn shutdown_stops_input_processing() {
        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .state(json!(null))
            .handler(MsgType::new("x", "y"), |ctx| async move {
                ctx.state.swap(|s| *s = json!("handled"));
                Ok(())
            })
            .build()
            .expect("build");

        cmp.shutdown();

        // Sliding input rejects outright; the ordered loop has exited.
        assert!(cmp
            .send_sliding(Msg::new(MsgType::new("x", "y"), json!(null)))
            .await
            .is_err());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = cmp.send(Msg::new(MsgType::new("x", "y"), json!(null))).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cmp.state().get(), json!(null));
    }

    #[tokio::test]
    async fn custom_watch_and_xform() {
        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .state(json!({"public": 1, "private": 2}))
            .watch(|s| s["public"].clone())
            .snapshot_xform(|v| json!({ "wrapped": v }))
            .build()
            .expect("build");

        assert_eq!(cmp.state_snapshot(), json!({"wrapped": 1}));
    }

    #[tokio::test]
    async fn initial_snapshot_published_on_ready() {
        let cmp = ComponentBuilder::<Value>::new("c1")
            .config(test_config())
            .state(json!({"counter": 7}))
            .build()
            .expect("build");

        let mut snapshots = cmp
            .snapshot_mult()
            .tap(&BufferSpec::Sliding(1))
            .expect("tap");

        cmp.system_ready().await;

        let msg = timeout(Duration::from_millis(500), snapshots.recv())
            .await
            .expect("timely snapshot")
            .expect("snapshot");
        assert_eq!(msg.msg_type, reserved::app_state());
        assert_eq!(msg.payload, json!({"counter": 7}));
        assert_eq!(msg.meta.from, Some(CmpId::new("c1")));
    }
}

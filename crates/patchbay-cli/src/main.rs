//! patchbay demo shell.
//!
//! Wires two components together by hand - the way a switchboard would -
//! and drives a ping/pong exchange between them:
//!
//! ```text
//!   pinger ──ping/req──► ponger
//!     ▲                    │
//!     └─────pong/res───────┘
//! ```
//!
//! The firehose of both components is tailed into the log, so running
//! with `--debug` (or `RUST_LOG=debug`) shows every message envelope as
//! it crosses the system.

use anyhow::Result;
use clap::Parser;
use patchbay_component::{
    BufferSpec, Component, ComponentBuilder, ComponentConfig, MsgSender,
};
use patchbay_msg::{Msg, MsgType};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// patchbay - message-passing component runtime demo
#[derive(Parser, Debug)]
#[command(name = "patchbay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging (includes the firehose tail)
    #[arg(short, long)]
    debug: bool,

    /// Number of ping/pong round trips to run
    #[arg(short, long, default_value_t = 3)]
    rounds: i64,
}

fn ping_req() -> MsgType {
    MsgType::new("ping", "req")
}

fn pong_res() -> MsgType {
    MsgType::new("pong", "res")
}

fn demo_config() -> ComponentConfig {
    ComponentConfig::default()
        .with_in_chan(BufferSpec::Fifo(8))
        .with_out_chan(BufferSpec::Fifo(8))
        .with_firehose_chan(BufferSpec::Sliding(64))
}

/// Pipes one component's topic subscription into another's input.
fn wire(
    from: &Component<Value>,
    msg_type: MsgType,
    to: MsgSender,
) -> Result<()> {
    let mut rx = from.out_pub().sub(msg_type, &BufferSpec::Fifo(8))?;
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if to.send(msg).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

/// Tails a component's firehose into the debug log.
fn tail_firehose(cmp: &Component<Value>) -> Result<()> {
    let mut rx = cmp.firehose_mult().tap(&BufferSpec::Sliding(64))?;
    tokio::spawn(async move {
        while let Some(env) = rx.recv().await {
            debug!(envelope = %env.msg_type, payload = %env.payload, "firehose");
        }
    });
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rounds = args.rounds.max(1);

    // The pinger counts completed round trips and re-pings until done.
    let pinger = ComponentBuilder::<Value>::new("pinger")
        .config(demo_config())
        .state(json!({"completed": 0}))
        .handler(pong_res(), move |ctx| async move {
            let n = ctx.payload["n"].as_i64().unwrap_or(0);
            info!(round = n, "pong received");
            ctx.state.swap(|s| s["completed"] = json!(n));
            if n < rounds {
                ctx.emitter
                    .emit(Msg::new(ping_req(), json!({"n": n + 1})))
                    .await;
            }
            Ok(())
        })
        .build()?;

    // The ponger echoes every ping back as a pong.
    let ponger = ComponentBuilder::<Value>::new("ponger")
        .config(demo_config())
        .handler(ping_req(), |ctx| async move {
            ctx.emitter
                .emit(Msg::new(pong_res(), ctx.payload.clone()))
                .await;
            Ok(())
        })
        .build()?;

    // Switchboard duty: connect outputs to inputs, tail the firehoses.
    wire(&pinger, ping_req(), ponger.in_sender())?;
    wire(&ponger, pong_res(), pinger.in_sender())?;
    tail_firehose(&pinger)?;
    tail_firehose(&ponger)?;

    // The first ping is emitted before the ready signal and buffers in the
    // put-channel until the wiring goes live.
    pinger
        .emitter()
        .emit(Msg::new(ping_req(), json!({"n": 1})))
        .await;

    pinger.system_ready().await;
    ponger.system_ready().await;

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let completed = pinger.state().read(|s| s["completed"].as_i64().unwrap_or(0));
        if completed >= rounds {
            break;
        }
        anyhow::ensure!(
            Instant::now() < deadline,
            "demo timed out after {completed}/{rounds} rounds"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    info!(rounds, "all round trips completed");
    println!(
        "completed {rounds} ping/pong round trips; final pinger state: {}",
        pinger.state_snapshot()
    );

    pinger.shutdown();
    ponger.shutdown();

    Ok(())
}

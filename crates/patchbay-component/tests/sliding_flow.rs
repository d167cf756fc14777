//! Sliding-input behaviour: latest-only buffering and the throttle that
//! back-pressures high-rate producers.

use patchbay_component::{BufferSpec, ComponentBuilder, ComponentConfig, Msg, MsgType};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

fn config() -> ComponentConfig {
    ComponentConfig::default()
        .with_sliding_in_chan(BufferSpec::Sliding(1))
        .with_throttle_ms(10)
        .with_firehose_chan(BufferSpec::Fifo(64))
}

async fn wait_until<F: Fn() -> bool>(what: &str, predicate: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if predicate() {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn burst_is_throttled_and_latest_survives() {
    let cmp = ComponentBuilder::<Value>::new("c1")
        .config(config())
        .state(json!([]))
        .state_pub_handler(|ctx| async move {
            let n = ctx.payload["n"].clone();
            ctx.state.swap(|s| {
                s.as_array_mut().expect("array state").push(n);
            });
            Ok(())
        })
        .build()
        .expect("build");

    // 100 messages, effectively instantaneous: sliding sends never block.
    for n in 1..=100 {
        cmp.send_sliding(Msg::new(MsgType::new("peer", "state"), json!({"n": n})))
            .await
            .expect("send");
    }

    // The final message is always among those processed.
    let state = cmp.state().clone();
    wait_until("final message to be handled", || {
        state.read(|s| {
            s.as_array()
                .is_some_and(|a| a.last() == Some(&json!(100)))
        })
    })
    .await;

    // With a 10ms throttle and a 1-element sliding buffer, the burst
    // collapses to far fewer invocations than messages.
    let seen = cmp.state().read(|s| s.as_array().expect("array state").len());
    assert!(seen >= 1);
    assert!(seen <= 11, "burst of 100 should collapse, saw {seen} invocations");
}

#[tokio::test]
async fn slow_stream_sees_every_message() {
    let cmp = ComponentBuilder::<Value>::new("c1")
        .config(config())
        .state(json!([]))
        .state_pub_handler(|ctx| async move {
            let n = ctx.payload["n"].clone();
            ctx.state.swap(|s| {
                s.as_array_mut().expect("array state").push(n);
            });
            Ok(())
        })
        .build()
        .expect("build");

    // Slower than the throttle: nothing is dropped.
    for n in 1..=3 {
        cmp.send_sliding(Msg::new(MsgType::new("peer", "state"), json!({"n": n})))
            .await
            .expect("send");
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    let state = cmp.state().clone();
    wait_until("all three messages to be handled", || {
        state.read(|s| s.as_array().is_some_and(|a| a.len() == 3))
    })
    .await;

    assert_eq!(cmp.state().get(), json!([1, 2, 3]));
}

#[tokio::test]
async fn sliding_and_ordered_inputs_are_independent() {
    let cmp = ComponentBuilder::<Value>::new("c1")
        .config(config().with_in_chan(BufferSpec::Fifo(16)))
        .state(json!({"ordered": 0, "sliding": 0}))
        .handler(MsgType::new("cmd", "tick"), |ctx| async move {
            ctx.state.swap(|s| {
                let n = s["ordered"].as_i64().unwrap_or(0);
                s["ordered"] = json!(n + 1);
            });
            Ok(())
        })
        .state_pub_handler(|ctx| async move {
            ctx.state.swap(|s| {
                let n = s["sliding"].as_i64().unwrap_or(0);
                s["sliding"] = json!(n + 1);
            });
            Ok(())
        })
        .build()
        .expect("build");

    cmp.send(Msg::new(MsgType::new("cmd", "tick"), json!(null)))
        .await
        .expect("send");
    cmp.send_sliding(Msg::new(MsgType::new("peer", "state"), json!(null)))
        .await
        .expect("send");

    let state = cmp.state().clone();
    wait_until("both loops to handle their message", || {
        state.read(|s| s["ordered"] == json!(1) && s["sliding"] == json!(1))
    })
    .await;
}

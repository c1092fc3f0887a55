use super::utils::*;
use crate::acquire::*;
use peerset_api::*;
use peerset_test_utils::id::{random_object_id, random_peer_id};
use peerset_test_utils::{enable_tracing, iter_check};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn interval_bounds_are_exclusive() {
    for (interval_ms, ok) in [
        (0, false),
        (10, false),
        (11, true),
        (250, true),
        (29_999, true),
        (30_000, false),
        (45_000, false),
    ] {
        let config = AcquireConfig {
            timer_interval_ms: interval_ms,
            ..Default::default()
        };
        let res = Acquire::with_standard_policy(
            random_object_id(),
            AcquireKind::LedgerData,
            config,
            Arc::new(MockPeerRegistry::new()),
            Arc::new(MockTaskQueue::new()),
        );
        assert_eq!(ok, res.is_ok(), "interval {interval_ms}ms");
    }
}

#[test]
fn config_defaults_register_under_module_name() {
    let mut config = peerset_api::config::Config::default();
    config
        .add_default_module_config::<AcquireConfig>(ACQUIRE_MOD_NAME.into())
        .unwrap();

    let parsed: AcquireConfig =
        config.get_module_config(ACQUIRE_MOD_NAME).unwrap();
    assert_eq!(250, parsed.timer_interval_ms);
    assert_eq!(Some(4), parsed.ledger_admission_limit);
    assert_eq!(None, parsed.tx_admission_limit);
    assert_eq!(8, parsed.fail_after_timeouts);
    assert_eq!(2, parsed.aggressive_after_timeouts);
}

#[tokio::test]
async fn timeouts_accumulate_without_progress() {
    let engine = Acquire::new(
        random_object_id(),
        AcquireKind::LedgerData,
        AcquireConfig::default(),
        Arc::new(MockPeerRegistry::new()),
        Arc::new(MockTaskQueue::new()),
        Arc::new(PassivePolicy),
    )
    .unwrap();

    for expect in 1..=5 {
        engine.evaluate_timer();
        assert_eq!(expect, engine.timeouts());
    }
    assert!(engine.is_active());
}

#[tokio::test]
async fn progress_resets_the_timeout_run() {
    let engine = Acquire::new(
        random_object_id(),
        AcquireKind::LedgerData,
        AcquireConfig::default(),
        Arc::new(MockPeerRegistry::new()),
        Arc::new(MockTaskQueue::new()),
        Arc::new(PassivePolicy),
    )
    .unwrap();

    engine.evaluate_timer();
    engine.evaluate_timer();
    assert_eq!(2, engine.timeouts());

    engine.mark_progress();
    assert!(engine.is_progressing());

    engine.evaluate_timer();
    assert_eq!(0, engine.timeouts());
    // the progress flag only covers one timer period
    assert!(!engine.is_progressing());

    engine.evaluate_timer();
    assert_eq!(1, engine.timeouts());
}

#[tokio::test]
async fn standard_policy_escalates_then_gives_up() {
    enable_tracing();
    let registry = test_registry().await;
    let sent = RequestsSent::default();
    let peer = random_peer_id();
    connect_peer(&registry, &peer, &sent);

    let config = AcquireConfig {
        aggressive_after_timeouts: 2,
        fail_after_timeouts: 3,
        ..Default::default()
    };
    let engine = Acquire::with_standard_policy(
        random_object_id(),
        AcquireKind::LedgerData,
        config,
        registry,
        Arc::new(MockTaskQueue::new()),
    )
    .unwrap();
    engine.note_peer_has(peer.clone());
    sent.lock().unwrap().clear();

    // first timeout: still passive, re-request from one peer
    engine.evaluate_timer();
    assert_eq!(1, engine.timeouts());
    assert!(!engine.is_aggressive());
    assert_eq!(vec![peer.clone()], recipients(&sent));
    sent.lock().unwrap().clear();

    // second timeout: escalates and broadcasts
    engine.evaluate_timer();
    assert!(engine.is_aggressive());
    assert_eq!(vec![peer.clone()], recipients(&sent));
    sent.lock().unwrap().clear();

    // third timeout: gives up, nothing more is sent
    engine.evaluate_timer();
    assert!(engine.is_failed());
    assert!(!engine.is_active());
    assert!(sent.lock().unwrap().is_empty());
    assert!(engine.state.lock().unwrap().timer.is_none());

    // further fires are inert
    engine.evaluate_timer();
    assert_eq!(3, engine.timeouts());
}

#[tokio::test]
async fn completion_races_the_timer() {
    let engine = Acquire::new(
        random_object_id(),
        AcquireKind::LedgerData,
        AcquireConfig::default(),
        Arc::new(MockPeerRegistry::new()),
        Arc::new(MockTaskQueue::new()),
        Arc::new(PassivePolicy),
    )
    .unwrap();

    engine.evaluate_timer();
    assert_eq!(1, engine.timeouts());

    engine.mark_complete();

    // a fire that was already in flight is a no-op
    engine.evaluate_timer();
    assert_eq!(1, engine.timeouts());
    assert!(engine.state.lock().unwrap().timer.is_none());
}

#[tokio::test(start_paused = true)]
async fn timer_fires_through_the_task_queue() {
    enable_tracing();
    let registry = test_registry().await;
    let queue = test_task_queue().await;

    let engine = Acquire::new(
        random_object_id(),
        AcquireKind::LedgerData,
        AcquireConfig::default(),
        registry,
        queue,
        Arc::new(PassivePolicy),
    )
    .unwrap();

    engine.start();
    assert_eq!(0, engine.timeouts());

    iter_check!({
        if engine.timeouts() >= 1 {
            break;
        }
    });

    engine.mark_complete();
    let settled = engine.timeouts();

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert_eq!(settled, engine.timeouts());
}

#[tokio::test(start_paused = true)]
async fn dropped_engine_cancels_its_timer() {
    let registry = test_registry().await;
    let queue = test_task_queue().await;
    let sent = RequestsSent::default();
    let peer = random_peer_id();
    connect_peer(&registry, &peer, &sent);

    let engine = Acquire::with_standard_policy(
        random_object_id(),
        AcquireKind::LedgerData,
        AcquireConfig::default(),
        registry,
        queue,
    )
    .unwrap();
    engine.note_peer_has(peer);
    sent.lock().unwrap().clear();
    engine.start();

    drop(engine);

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pending_evaluation_after_drop_is_noop() {
    let (queue, tasks) = capture_queue();
    let registry = test_registry().await;
    let sent = RequestsSent::default();
    let peer = random_peer_id();
    connect_peer(&registry, &peer, &sent);

    let engine = Acquire::with_standard_policy(
        random_object_id(),
        AcquireKind::LedgerData,
        AcquireConfig::default(),
        registry,
        queue,
    )
    .unwrap();
    engine.note_peer_has(peer);
    sent.lock().unwrap().clear();

    engine.timer_fired();
    let task = tasks.lock().unwrap().pop().unwrap();

    // the owner abandons the engine while its evaluation is queued
    drop(engine);

    task.await;
    assert!(sent.lock().unwrap().is_empty());
}

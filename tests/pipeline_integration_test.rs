//! 流水线引擎集成测试：背压、取消传播、部分失败

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use newsroom::pipeline::{channel, retain, Filter, Pipeline, PipelineError, Transform};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_backpressure_bounds_unconsumed_work() {
    const CAPACITY: usize = 2;
    const WORKERS: usize = 3;

    let processed = Arc::new(AtomicUsize::new(0));
    let parent = CancellationToken::new();
    let mut pipe = Pipeline::with_parent(&parent);
    let (tx0, rx0) = channel(1);
    let (tx1, held_rx) = channel::<u32>(CAPACITY);

    let counter = Arc::clone(&processed);
    pipe.source("numbers", 0..1_000u32, tx0);
    pipe.connect(
        "count",
        Transform::new(move |n: u32| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(n)
            }
        }),
        rx0,
        tx1,
        WORKERS,
    );

    let run = tokio::spawn(pipe.run_to_completion());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let seen = processed.load(Ordering::SeqCst);
    assert!(seen <= CAPACITY + WORKERS, "processed {seen} items with no consumer");
    assert_eq!(held_rx.len(), CAPACITY);

    parent.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("pipeline must unwind after cancellation")
        .unwrap();
    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

#[tokio::test]
async fn test_slow_consumer_receives_every_item() {
    let mut pipe = Pipeline::new();
    let (tx0, rx0) = channel(1);
    let (tx1, mut rx1) = channel(1);

    pipe.source("numbers", 0..50u32, tx0);
    pipe.connect("identity", Transform::new(|n: u32| async move { Ok(n) }), rx0, tx1, 4);

    let consumer = tokio::spawn(async move {
        let mut received = Vec::new();
        while let Some(n) = rx1.recv().await {
            tokio::time::sleep(Duration::from_millis(2)).await;
            received.push(n);
        }
        received
    });

    pipe.run_to_completion().await.unwrap();
    let mut received = consumer.await.unwrap();
    received.sort_unstable();
    assert_eq!(received, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_always_failing_stage_cancels_everything() {
    let mut pipe = Pipeline::new();
    let (tx0, rx0) = channel(1);
    let (tx1, rx1) = channel(1);
    let (tx2, rx2) = channel(1);
    let (tx3, _rx3) = channel::<Vec<u32>>(1);

    pipe.source("forever", 0u32.., tx0);
    pipe.connect("pass", Transform::new(|n: u32| async move { Ok(n) }), rx0, tx1, 3);
    pipe.connect(
        "fail",
        Transform::new(|_: u32| async move { Err::<u32, _>(anyhow::anyhow!("assistant exploded")) }),
        rx1,
        tx2,
        3,
    );
    pipe.aggregate("collect", rx2, tx3);

    let result = tokio::time::timeout(Duration::from_secs(5), pipe.run_to_completion())
        .await
        .expect("no worker may stay blocked");
    match result {
        Err(PipelineError::Stage { stage, source }) => {
            assert_eq!(stage, "fail");
            assert_eq!(source.to_string(), "assistant exploded");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_filter_drops_exactly_invalid_items() {
    const N: u32 = 20;

    let mut pipe = Pipeline::new();
    let (tx0, rx0) = channel(1);
    let (tx1, rx1) = channel(1);
    let (tx2, rx2) = channel(1);
    let (tx3, rx3) = channel(1);
    let (tx4, mut rx4) = channel(1);

    pipe.source("items", 0..N, tx0);
    // 3 的倍数标记为无效
    pipe.connect(
        "mark",
        Transform::new(|n: u32| async move { Ok(if n % 3 == 0 { Err(n) } else { Ok(n) }) }),
        rx0,
        tx1,
        4,
    );
    pipe.connect("filter", Filter::new(|r: Result<u32, u32>| r.ok()), rx1, tx2, 2);
    pipe.connect("odd_only", retain(|n: &u32| n % 2 == 1), rx2, tx3, 1);
    pipe.aggregate("collect", rx3, tx4);

    pipe.run_to_completion().await.unwrap();
    let mut survivors = rx4.recv().await.unwrap();
    survivors.sort_unstable();
    let expected: Vec<u32> = (0..N).filter(|n| n % 3 != 0 && n % 2 == 1).collect();
    assert_eq!(survivors, expected);
}

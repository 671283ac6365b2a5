//! Integration tests for core-async on native platforms.
//!
//! These tests verify that the async abstraction works correctly with Tokio.

#![cfg(not(target_arch = "wasm32"))]

use core_async::{future, sync, task, time};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    let result = handle.await.unwrap();
    assert_eq!(result, 42);
}

#[tokio::test(start_paused = true)]
async fn test_sleep() {
    let start = tokio::time::Instant::now();
    time::sleep(time::Duration::from_millis(50)).await;
    assert!(start.elapsed() >= time::Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_success() {
    let result = time::timeout(time::Duration::from_millis(100), async {
        time::sleep(time::Duration::from_millis(10)).await;
        42
    })
    .await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_mutex() {
    let mutex = Arc::new(sync::Mutex::new(0));

    let mut handles = vec![];
    for _ in 0..10 {
        let mutex = mutex.clone();
        handles.push(task::spawn(async move {
            let mut guard = mutex.lock().await;
            *guard += 1;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*mutex.lock().await, 10);
}

#[tokio::test(start_paused = true)]
async fn test_detached_timers_fire_in_order() {
    let fired = Arc::new(AtomicUsize::new(0));

    for delay in [30u64, 10, 20] {
        let fired = fired.clone();
        task::spawn_detached(async move {
            time::sleep(time::Duration::from_secs(delay)).await;
            fired.fetch_add(1, Ordering::SeqCst);
        });
    }

    time::sleep(time::Duration::from_secs(15)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    time::sleep(time::Duration::from_secs(20)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_yield_now() {
    task::yield_now().await;
}

#[tokio::test]
async fn test_boxed_future() {
    let futures: Vec<future::PlatformBoxFuture<'static, u32>> =
        vec![future::boxed(async { 1 }), future::boxed(async { 2 })];

    let mut total = 0;
    for fut in futures {
        total += fut.await;
    }
    assert_eq!(total, 3);
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_sds011_exporter::executor::{execute_with_retry, CommandError, RetryPolicy};
use rust_sds011_exporter::sensor::SensorError;

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(200))
        .with_backoff_unit(Duration::from_millis(20))
}

#[tokio::test]
async fn single_attempt_success_returns_value() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result = execute_with_retry(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42u8)
        },
        fast_policy(0),
    )
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_retries_fails_fast_without_backoff() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let started = Instant::now();

    let result: Result<(), _> = execute_with_retry(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(SensorError::CommandFailed)
        },
        RetryPolicy::new(0, Duration::from_secs(5)),
    )
    .await;

    assert!(matches!(result, Err(CommandError::Device(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    // No back-off sleep and no waiting out the timeout window
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn exhausted_retries_make_n_plus_one_attempts_with_backoff() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let started = Instant::now();

    let result: Result<(), _> = execute_with_retry(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(SensorError::CommandFailed)
        },
        fast_policy(2),
    )
    .await;

    assert!(matches!(result, Err(CommandError::Device(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // Linear back-off: 1 + 2 units before retries 1 and 2
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn success_before_timeout_does_not_wait_out_the_window() {
    let started = Instant::now();

    let result = execute_with_retry(
        || Ok("done"),
        RetryPolicy::new(0, Duration::from_secs(10)),
    )
    .await;

    assert_eq!(result.unwrap(), "done");
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn timeout_is_recorded_and_worker_abandoned() {
    let started = Instant::now();

    let result: Result<(), _> = execute_with_retry(
        || {
            std::thread::sleep(Duration::from_secs(2));
            Ok(())
        },
        RetryPolicy::new(0, Duration::from_millis(50)),
    )
    .await;

    match result {
        Err(CommandError::Timeout { retries }) => assert_eq!(retries, 0),
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
    // The executor must not block on the sleeping worker
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn retry_after_timeout_starts_a_fresh_attempt() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let started = Instant::now();

    let result = execute_with_retry(
        move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                // First attempt hangs past its window
                std::thread::sleep(Duration::from_millis(500));
            }
            Ok(7u8)
        },
        fast_policy(1),
    )
    .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    // Timed out first window (200ms) + back-off (20ms) + fast second attempt,
    // well before the abandoned worker would have finished
    assert!(started.elapsed() < Duration::from_millis(450));
}

#[tokio::test]
async fn last_failure_reason_wins() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    // First attempt errors, second times out: final reason is the timeout.
    let result: Result<(), _> = execute_with_retry(
        move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SensorError::CommandFailed)
            } else {
                std::thread::sleep(Duration::from_secs(2));
                Ok(())
            }
        },
        fast_policy(1),
    )
    .await;

    match result {
        Err(CommandError::Timeout { retries }) => assert_eq!(retries, 1),
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
}

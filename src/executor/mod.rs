// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Bounded-retry execution of blocking device commands.
//!
//! The SDS011 driver calls are synchronous and can hang if the device stops
//! answering, so every startup command is run on a worker thread and raced
//! against a per-attempt timeout. The worker hands its result back over a
//! single-use oneshot channel; when the timeout wins the race the worker is
//! abandoned, never joined and never cancelled. The leak is accepted: on the
//! startup path the process exits on final failure, and a later attempt simply
//! starts a fresh worker.
//!
//! Retries are linear back-off: before retry `n` the executor sleeps
//! `n × backoff_unit`. With `max_retries = 0` (the operative default) exactly
//! one attempt is made and any failure is immediately final, so an
//! unresponsive device produces a fast, observable crash instead of a silent
//! hang.

use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task;
use tokio::time;

use crate::sensor::SensorError;

/// Resilience parameters for one device command.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// How long to wait for a single attempt before declaring it lost.
    pub attempt_timeout: Duration,
    /// Base unit of the linear back-off between attempts.
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_retries,
            attempt_timeout,
            backoff_unit: Duration::from_secs(1),
        }
    }

    /// Override the back-off unit, mainly to keep tests fast.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }
}

impl Default for RetryPolicy {
    // 0 retries, exit on failure; 10 second API call timeout
    fn default() -> Self {
        Self::new(0, Duration::from_secs(10))
    }
}

/// Final outcome of a command whose attempts are exhausted.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The device reported an error on the last attempt
    #[error("device command failed: {0}")]
    Device(#[from] SensorError),

    /// The last attempt did not answer within the per-attempt timeout
    #[error("device API response timeout ({retries} retries)")]
    Timeout { retries: u32 },

    /// The worker thread went away without reporting a result
    #[error("device worker dropped before reporting a result")]
    WorkerGone,
}

/// Run `operation` under the given retry policy.
///
/// Each attempt spawns the blocking operation on a worker thread and races
/// its completion against `policy.attempt_timeout`. The first success wins
/// immediately; an error or timeout is recorded as the current failure reason
/// and the next attempt (if any) starts after its back-off sleep. The result
/// of a timed-out attempt is discarded if it ever arrives.
pub async fn execute_with_retry<T, F>(operation: F, policy: RetryPolicy) -> Result<T, CommandError>
where
    F: Fn() -> Result<T, SensorError> + Send + Clone + 'static,
    T: Send + 'static,
{
    let mut last_failure = CommandError::Timeout { retries: 0 };

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            debug!("Retrying API call, retry {}", attempt);
            time::sleep(policy.backoff_unit * attempt).await;
        }

        let (response_tx, response_rx) = oneshot::channel();
        let op = operation.clone();
        // Detached on purpose: a timed-out worker is abandoned, not joined.
        let _worker = task::spawn_blocking(move || {
            // The receiver may already have given up on this attempt.
            let _ = response_tx.send(op());
        });

        match time::timeout(policy.attempt_timeout, response_rx).await {
            Ok(Ok(Ok(value))) => return Ok(value),
            Ok(Ok(Err(err))) => {
                warn!("Device command failed: {}", err);
                last_failure = CommandError::Device(err);
            }
            Ok(Err(_closed)) => {
                warn!("Device worker dropped before reporting a result");
                last_failure = CommandError::WorkerGone;
            }
            Err(_elapsed) => {
                warn!("Device API response timeout, retries so far: {}", attempt);
                last_failure = CommandError::Timeout { retries: attempt };
            }
        }
    }

    Err(last_failure)
}

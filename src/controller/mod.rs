// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device controller: startup sequence and measurement loop.
//!
//! The controller owns the sensor handle for the lifetime of the process. On
//! startup it walks a short ordered sequence of fallible steps: switch the
//! device to passive mode (through the command executor and its retry
//! policy), read or force-set the working cycle, then switch to active mode.
//! Any failure in that sequence is returned to the caller, which treats it as
//! fatal. A daemon that cannot initialize its device must not masquerade as
//! healthy.
//!
//! After startup it enters the measurement loop: read one measurement,
//! publish it into the metrics sink, repeat. Read failures there are logged
//! and retried immediately with no bound; a transient serial hiccup must not
//! take down an otherwise-working exporter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::Mutex;
use tokio::task;

use crate::config::SensorConfig;
use crate::executor::{execute_with_retry, CommandError, RetryPolicy};
use crate::metrics::MetricsSink;
use crate::sensor::{SensorControl, SensorError};

/// Startup parameters for one controller, derived from [`SensorConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    /// Desired working cycle in minutes.
    pub cycle_minutes: u8,
    /// Set the cycle unconditionally instead of read-compare-set.
    pub force_set_cycle: bool,
    /// Retry policy for startup commands.
    pub policy: RetryPolicy,
}

impl From<&SensorConfig> for ControllerSettings {
    fn from(config: &SensorConfig) -> Self {
        Self {
            cycle_minutes: config.cycle_minutes,
            force_set_cycle: config.force_set_cycle,
            policy: RetryPolicy::new(
                config.max_retries,
                Duration::from_secs(config.command_timeout_seconds),
            ),
        }
    }
}

/// Drives one sensor from initialization through the endless measurement loop.
///
/// The sensor handle sits behind an async mutex so that per-attempt worker
/// threads can reach it; nothing outside this controller ever touches it.
pub struct SensorController<S> {
    sensor: Arc<Mutex<S>>,
    sink: Arc<MetricsSink>,
    settings: ControllerSettings,
    running: Arc<AtomicBool>,
}

impl<S> SensorController<S>
where
    S: SensorControl + Send + 'static,
{
    pub fn new(
        sensor: S,
        sink: Arc<MetricsSink>,
        settings: ControllerSettings,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            sensor: Arc::new(Mutex::new(sensor)),
            sink,
            settings,
            running,
        }
    }

    /// Run the startup sequence, then the measurement loop.
    ///
    /// Returns `Err` only for startup failures; once the measurement loop is
    /// entered this resolves only when the running flag is cleared.
    pub async fn run(self) -> Result<(), CommandError> {
        self.enter_passive_mode().await?;
        self.configure_cycle().await?;
        self.enter_active_mode().await?;
        self.read_loop().await;
        Ok(())
    }

    async fn enter_passive_mode(&self) -> Result<(), CommandError> {
        debug!("Switching sensor to passive mode");
        let sensor = self.sensor.clone();
        execute_with_retry(
            move || sensor.blocking_lock().set_passive_mode(),
            self.settings.policy,
        )
        .await
    }

    async fn configure_cycle(&self) -> Result<(), CommandError> {
        let wanted = self.settings.cycle_minutes;

        if self.settings.force_set_cycle {
            info!("Setting sensor cycle to {} minutes", wanted);
            return self.call_blocking(move |s| s.set_cycle(wanted)).await;
        }

        let current = self.call_blocking(|s| s.cycle()).await?;
        debug!("Sensor reports current cycle of {} minutes", current);
        if current != wanted {
            info!("Setting sensor cycle to {} minutes", wanted);
            self.call_blocking(move |s| s.set_cycle(wanted)).await?;
        }
        Ok(())
    }

    async fn enter_active_mode(&self) -> Result<(), CommandError> {
        info!("Switching sensor to active mode");
        self.call_blocking(|s| s.set_active_mode()).await
    }

    // Steady state. Read errors are absorbed here and never escalated; the
    // previously published gauge values stay untouched on failure.
    async fn read_loop(&self) {
        info!("Entering measurement loop");
        while self.running.load(Ordering::SeqCst) {
            match self.call_blocking(|s| s.read_measurement()).await {
                Ok(measurement) => {
                    info!("Sensor measurement results: {}", measurement);
                    self.sink.record_measurement(&measurement);
                }
                Err(err) => {
                    error!("Getting sensor measurement error: {}", err);
                }
            }
        }
        info!("Measurement loop stopped");
    }

    // Run one blocking driver call on a worker thread, without a timeout.
    async fn call_blocking<T, F>(&self, f: F) -> Result<T, CommandError>
    where
        F: FnOnce(&mut S) -> Result<T, SensorError> + Send + 'static,
        T: Send + 'static,
    {
        let sensor = self.sensor.clone();
        match task::spawn_blocking(move || f(&mut *sensor.blocking_lock())).await {
            Ok(result) => result.map_err(CommandError::Device),
            Err(_join) => Err(CommandError::WorkerGone),
        }
    }
}

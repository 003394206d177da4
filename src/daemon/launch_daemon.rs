// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Background task management for the exporter.
//!
//! Two long-lived tasks are launched at process start and run for the process
//! lifetime: the metrics web server and the sensor controller. Neither is
//! expected to return normally. Fatal errors are handled where they are
//! detected: a failed startup command, an unopenable serial port or a web
//! server that cannot bind all log the cause and terminate the process with a
//! non-zero status. There is no supervisor restarting either task.

use anyhow::Result;
use log::{debug, error, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::Config;
use crate::controller::{ControllerSettings, SensorController};
use crate::exporter::build_rocket;
use crate::metrics::MetricsSink;
use crate::sensor::{Sds011Sensor, SimulatedSensor};
use rocket::config::LogLevel;

/// Represents a daemon task manager that coordinates the background services
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Launch all tasks: web server, sensor controller and heartbeat.
    pub async fn launch(&mut self, config: &Config, sink: Arc<MetricsSink>) -> Result<()> {
        self.start_web_server(config, sink.clone())?;
        self.start_sensor_controller(config, sink)?;
        self.start_heartbeat()?;
        Ok(())
    }

    /// Start the Rocket web server serving the metrics endpoint
    fn start_web_server(&mut self, config: &Config, sink: Arc<MetricsSink>) -> Result<()> {
        info!(
            "Starting HTTP server on {}:{}",
            config.exporter.address, config.exporter.port
        );

        let figment = rocket::Config::figment()
            .merge(("ident", config.exporter.name.clone()))
            .merge(("address", config.exporter.address.clone()))
            .merge(("port", config.exporter.port))
            .merge(("log_level", LogLevel::Normal));

        let rocket = build_rocket(figment, sink);

        let task = tokio::spawn(async move {
            let outcome = async {
                let ignited = rocket.ignite().await?;
                ignited.launch().await?;
                Ok::<(), rocket::Error>(())
            }
            .await;

            if let Err(e) = outcome {
                error!("Server error: {}", e);
                std::process::exit(1);
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start the sensor controller task
    fn start_sensor_controller(&mut self, config: &Config, sink: Arc<MetricsSink>) -> Result<()> {
        info!("Starting sensor controller task");

        let sensor_config = config.sensor.clone();
        let running = self.running.clone();

        let task = tokio::spawn(async move {
            let settings = ControllerSettings::from(&sensor_config);

            let outcome = if sensor_config.simulated {
                info!("Using simulated sensor");
                let controller =
                    SensorController::new(SimulatedSensor::new(), sink, settings, running);
                controller.run().await
            } else {
                let path = sensor_config.port_path.clone();
                let sensor =
                    match tokio::task::spawn_blocking(move || Sds011Sensor::open(&path)).await {
                        Ok(Ok(sensor)) => sensor,
                        Ok(Err(e)) => {
                            error!("Cannot create sensor instance: {}", e);
                            std::process::exit(1);
                        }
                        Err(e) => {
                            error!("Sensor open worker failed: {}", e);
                            std::process::exit(1);
                        }
                    };
                let controller = SensorController::new(sensor, sink, settings, running);
                controller.run().await
            };

            if let Err(e) = outcome {
                error!("Sensor startup failed: {}", e);
                std::process::exit(1);
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start a heartbeat task that logs liveness periodically
    fn start_heartbeat(&mut self) -> Result<()> {
        debug!("Starting heartbeat monitor");

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                debug!("Daemon heartbeat: running");
                time::sleep(Duration::from_secs(60)).await;
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Signal all tasks to stop at their next checkpoint
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Shared running flag checked by the controller loop and heartbeat.
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Task panicked: {}", e);
            }
        }
        Ok(())
    }
}

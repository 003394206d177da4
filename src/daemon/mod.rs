// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Module
//!
//! Runs and manages the exporter's background services: the metrics web
//! server, the sensor controller task and a heartbeat monitor.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_sds011_exporter::{config::Config, daemon::Daemon, metrics::MetricsSink};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!     let sink = Arc::new(MetricsSink::new()?);
//!
//!     let mut daemon = Daemon::new();
//!     daemon.launch(&config, sink).await?;
//!
//!     // Runs until externally terminated
//!     daemon.join().await
//! }
//! ```

pub mod launch_daemon;

pub use launch_daemon::Daemon;

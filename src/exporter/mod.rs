// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Metrics web endpoint
//!
//! Serves the gauge values written by the device controller over HTTP, in the
//! Prometheus text exposition format. The server shares no state with the
//! controller except the [`crate::metrics::MetricsSink`] handed to
//! [`server::build_rocket`] at construction time.

pub mod server;

pub use server::build_rocket;

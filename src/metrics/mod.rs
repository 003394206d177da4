// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Process-wide particulate gauge store.
//!
//! [`MetricsSink`] owns its own `prometheus::Registry` instead of the crate's
//! default global one, so both the controller task (writer) and the web task
//! (reader) receive the same `Arc<MetricsSink>` at construction time. The
//! gauge vector is internally synchronized; no external locking is needed for
//! concurrent reads and writes.

use anyhow::{Context, Result};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::sensor::Measurement;

/// Gauge label values for the two particulate sizes.
pub const LABEL_PM25: &str = "pm2.5";
pub const LABEL_PM10: &str = "pm10";

/// Shared registry holding the `airquality_pm{type=...}` gauge.
pub struct MetricsSink {
    registry: Registry,
    airquality_pm: GaugeVec,
}

impl MetricsSink {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let airquality_pm = GaugeVec::new(
            Opts::new("airquality_pm", "Airquality PM metric"),
            &["type"],
        )
        .context("Failed to create airquality_pm gauge")?;
        registry
            .register(Box::new(airquality_pm.clone()))
            .context("Failed to register airquality_pm gauge")?;
        Ok(Self {
            registry,
            airquality_pm,
        })
    }

    /// Overwrite both gauges with the values of one measurement.
    pub fn record_measurement(&self, measurement: &Measurement) {
        self.airquality_pm
            .with_label_values(&[LABEL_PM25])
            .set(measurement.pm25);
        self.airquality_pm
            .with_label_values(&[LABEL_PM10])
            .set(measurement.pm10);
    }

    /// Current value of one gauge, by label.
    pub fn pm_value(&self, label: &str) -> f64 {
        self.airquality_pm.with_label_values(&[label]).get()
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Encoded metrics are not valid UTF-8")
    }

    /// MIME type of the text exposition format.
    pub fn format_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

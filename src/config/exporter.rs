// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Metrics web server configuration

use serde::{Deserialize, Serialize};

/// Network settings for the metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address to listen on for web interface and telemetry.
    pub address: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Server identification string sent in responses.
    pub name: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
            name: format!("Sds011Exporter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

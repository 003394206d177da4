// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sensor device configuration

use serde::{Deserialize, Serialize};

/// Serial device and polling settings for the SDS011.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Serial port path.
    pub port_path: String,

    /// Sensor cycle length in minutes. The value is stored on the device and
    /// persists across restarts.
    pub cycle_minutes: u8,

    /// Force set the cycle on every program start instead of reading the
    /// device value first.
    pub force_set_cycle: bool,

    /// Additional attempts after a failed startup command. With 0 the first
    /// failure is final.
    pub max_retries: u32,

    /// Per-attempt timeout for startup commands, in seconds.
    pub command_timeout_seconds: u64,

    /// Use the built-in simulated sensor instead of real hardware.
    pub simulated: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port_path: "/dev/ttyUSB0".to_string(),
            cycle_minutes: 5,
            force_set_cycle: true,
            max_retries: 0,
            command_timeout_seconds: 10,
            simulated: false,
        }
    }
}

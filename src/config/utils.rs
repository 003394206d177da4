// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! Validation helpers that go beyond what the JSON schema can express, plus
//! schema output for tooling.

use anyhow::{Context, Result};

use super::Config;

/// Output the embedded JSON schema to the console.
///
/// Called when the `--show-config-schema` flag is provided on the command
/// line.
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../../resources/config.schema.json");
    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;
    println!("{}", formatted_schema);
    Ok(())
}

/// Check if a string is a valid listen address.
///
/// Accepts IPv4 and IPv6 addresses as well as the special value "localhost".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }
    addr == "localhost"
}

/// Validate rules the schema cannot capture.
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    if !is_valid_ip_address(&config.exporter.address) {
        anyhow::bail!(
            "Invalid listen address in configuration: {}",
            config.exporter.address
        );
    }

    if config.exporter.port == 0 {
        anyhow::bail!("Listen port must be greater than 0");
    }

    if config.sensor.command_timeout_seconds == 0 {
        anyhow::bail!("Sensor command timeout must be greater than 0 seconds");
    }

    if config.sensor.port_path.is_empty() && !config.sensor.simulated {
        anyhow::bail!("Serial port path must not be empty");
    }

    Ok(())
}

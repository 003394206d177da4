// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the SDS011 exporter
//!
//! The configuration is backed by a YAML file and validated against a JSON
//! schema before deserialization. It is organized in two sections:
//! - `exporter`: network settings for the metrics web server
//! - `sensor`: serial port, sampling cycle and command retry policy
//!
//! Command line flags override individual values through
//! [`Config::apply_args`]. When the configured file does not exist a default
//! one is written in its place; when validation fails a `*.sample.yaml` file
//! with defaults is generated next to it for the user to edit.

pub mod exporter;
pub mod sensor;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use exporter::ExporterConfig;
pub use sensor::SensorConfig;

/// Root configuration structure for the exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Metrics web server settings.
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Sensor device and polling settings.
    #[serde(default)]
    pub sensor: SensorConfig,
}

impl Config {
    // Write a default configuration next to a rejected one so the user has a
    // valid document to start from.
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample_path = path.as_ref().with_extension("sample.yaml");
        debug!("Creating sample configuration file at {:?}", sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create parent directory {:?}", parent))?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file, creating a default one if it does not
    /// exist yet.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;
        let json_value = serde_json::to_value(&yaml_value)
            .with_context(|| format!("Failed to convert YAML to JSON for validation: {:?}", path))?;

        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(validation_error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", validation_error);
        }

        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                match Self::create_sample_config(path) {
                    Ok(_) => debug!("Successfully created sample config"),
                    Err(e) => error!("Failed to create sample config: {}", e),
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;
        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only values that are explicitly provided override the configuration
    /// loaded from the file.
    pub fn apply_args(
        &mut self,
        web_address: Option<String>,
        web_port: Option<u16>,
        port_path: Option<String>,
        cycle: Option<u8>,
        force_set_cycle: Option<bool>,
        simulate: bool,
    ) {
        if let Some(address) = web_address {
            debug!("Overriding listen address from command line: {}", address);
            self.exporter.address = address;
        }

        if let Some(port) = web_port {
            debug!("Overriding listen port from command line: {}", port);
            self.exporter.port = port;
        }

        if let Some(path) = port_path {
            debug!("Overriding serial port path from command line: {}", path);
            self.sensor.port_path = path;
        }

        if let Some(cycle) = cycle {
            debug!("Overriding sensor cycle from command line: {}", cycle);
            self.sensor.cycle_minutes = cycle;
        }

        if let Some(force) = force_set_cycle {
            debug!("Overriding force-set-cycle from command line: {}", force);
            self.sensor.force_set_cycle = force;
        }

        if simulate {
            debug!("Simulated sensor enabled from command line");
            self.sensor.simulated = true;
        }
    }
}

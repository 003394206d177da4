// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sensor driver boundary
//!
//! This module defines the small synchronous API the rest of the exporter
//! depends on: a [`SensorControl`] trait covering mode switching, cycle
//! configuration and single-measurement reads, together with the
//! [`Measurement`] value and the [`SensorError`] taxonomy.
//!
//! Two implementations are provided:
//! - [`sds011::Sds011Sensor`]: the real driver speaking the SDS011 serial
//!   frame protocol over a `serialport` handle
//! - [`simulation::SimulatedSensor`]: a hardware-free stand-in producing
//!   plausible particulate values, selectable from the configuration

pub mod sds011;
pub mod simulation;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sds011::Sds011Sensor;
pub use simulation::SimulatedSensor;

/// One particulate matter reading, in µg/m³.
///
/// Produced once per sensor read and immediately projected into the metrics
/// sink; not retained anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// PM2.5 concentration in µg/m³
    pub pm25: f64,
    /// PM10 concentration in µg/m³
    pub pm10: f64,
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pm2.5={} pm10={}", self.pm25, self.pm10)
    }
}

/// Errors surfaced by the sensor driver.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A read or write on the open port failed
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No valid reply frame could be synchronized on the wire
    #[error("no valid frame received from sensor")]
    InvalidFrame,

    /// A frame arrived with a bad checksum
    #[error("frame checksum mismatch")]
    Checksum,

    /// The device acknowledged the command with an unexpected reply
    #[error("device rejected command: unexpected reply")]
    CommandFailed,
}

/// Synchronous control surface of a particulate matter sensor.
///
/// All calls are blocking; callers that need timeouts run them through the
/// command executor on a worker thread.
pub trait SensorControl {
    /// Switch the device to passive (query) reporting mode.
    fn set_passive_mode(&mut self) -> Result<(), SensorError>;

    /// Switch the device to active (streaming) reporting mode.
    fn set_active_mode(&mut self) -> Result<(), SensorError>;

    /// Read the currently configured working cycle, in minutes.
    fn cycle(&mut self) -> Result<u8, SensorError>;

    /// Set the working cycle, in minutes. The value persists on the device
    /// across power cycles.
    fn set_cycle(&mut self, minutes: u8) -> Result<(), SensorError>;

    /// Read one measurement. In active mode this waits for the next streamed
    /// data frame.
    fn read_measurement(&mut self) -> Result<Measurement, SensorError>;
}

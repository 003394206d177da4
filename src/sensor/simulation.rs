// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated particulate matter sensor.
//!
//! Behaves like an SDS011 that always cooperates: mode switches and cycle
//! configuration succeed immediately, and reads produce values that drift
//! around a configurable baseline. Useful for running the exporter without
//! hardware attached (`sensor.simulated: true` in the configuration).

use std::time::Duration;

use log::debug;
use rand::Rng;

use super::{Measurement, SensorControl, SensorError};

/// In-memory stand-in for a real sensor.
pub struct SimulatedSensor {
    cycle_minutes: u8,
    passive: bool,
    pm25_baseline: f64,
    pm10_baseline: f64,
    report_interval: Duration,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self {
            cycle_minutes: 0,
            passive: false,
            pm25_baseline: 12.0,
            pm10_baseline: 21.0,
            report_interval: Duration::from_secs(1),
        }
    }

    /// Override the pause between simulated data reports (the real device
    /// streams roughly once per second in continuous mode).
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorControl for SimulatedSensor {
    fn set_passive_mode(&mut self) -> Result<(), SensorError> {
        debug!("Simulated sensor switched to passive mode");
        self.passive = true;
        Ok(())
    }

    fn set_active_mode(&mut self) -> Result<(), SensorError> {
        debug!("Simulated sensor switched to active mode");
        self.passive = false;
        Ok(())
    }

    fn cycle(&mut self) -> Result<u8, SensorError> {
        Ok(self.cycle_minutes)
    }

    fn set_cycle(&mut self, minutes: u8) -> Result<(), SensorError> {
        debug!("Simulated sensor cycle set to {} minutes", minutes);
        self.cycle_minutes = minutes;
        Ok(())
    }

    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        std::thread::sleep(self.report_interval);
        let mut rng = rand::rng();
        let pm25 = (self.pm25_baseline + rng.random_range(-3.0..3.0)).max(0.0);
        let pm10 = (self.pm10_baseline + rng.random_range(-5.0..5.0)).max(0.0);
        Ok(Measurement { pm25, pm10 })
    }
}

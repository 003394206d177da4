// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scripted sensor used by the integration tests.
//!
//! Records every driver call and plays back a queue of read results. When the
//! queue is drained it clears the controller's running flag so the
//! measurement loop terminates, which the real daemon only does at process
//! shutdown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_sds011_exporter::sensor::{Measurement, SensorControl, SensorError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetPassive,
    SetActive,
    GetCycle,
    SetCycle(u8),
    Read,
}

struct Inner {
    calls: Vec<Call>,
    cycle: u8,
    fail_passive: bool,
    passive_delay: Option<Duration>,
    reads: VecDeque<Result<Measurement, ()>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

/// Clonable handle; all clones share the same call log and script.
#[derive(Clone)]
pub struct ScriptedSensor {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedSensor {
    pub fn new(device_cycle: u8) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                calls: Vec::new(),
                cycle: device_cycle,
                fail_passive: false,
                passive_delay: None,
                reads: VecDeque::new(),
                stop_flag: None,
            })),
        }
    }

    /// Make `set_passive_mode` return an error.
    pub fn fail_passive(&self) {
        self.inner.lock().unwrap().fail_passive = true;
    }

    /// Make `set_passive_mode` block for `delay` before answering.
    pub fn delay_passive(&self, delay: Duration) {
        self.inner.lock().unwrap().passive_delay = Some(delay);
    }

    /// Queue one read result; `Err(())` plays back as a read failure.
    pub fn push_read(&self, result: Result<Measurement, ()>) {
        self.inner.lock().unwrap().reads.push_back(result);
    }

    /// Clear `flag` once the read queue is drained.
    pub fn stop_when_drained(&self, flag: Arc<AtomicBool>) {
        self.inner.lock().unwrap().stop_flag = Some(flag);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn device_cycle(&self) -> u8 {
        self.inner.lock().unwrap().cycle
    }
}

impl SensorControl for ScriptedSensor {
    fn set_passive_mode(&mut self) -> Result<(), SensorError> {
        let (fail, delay) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(Call::SetPassive);
            (inner.fail_passive, inner.passive_delay)
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if fail {
            return Err(SensorError::CommandFailed);
        }
        Ok(())
    }

    fn set_active_mode(&mut self) -> Result<(), SensorError> {
        self.inner.lock().unwrap().calls.push(Call::SetActive);
        Ok(())
    }

    fn cycle(&mut self) -> Result<u8, SensorError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::GetCycle);
        Ok(inner.cycle)
    }

    fn set_cycle(&mut self, minutes: u8) -> Result<(), SensorError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::SetCycle(minutes));
        inner.cycle = minutes;
        Ok(())
    }

    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Read);
        match inner.reads.pop_front() {
            Some(Ok(measurement)) => Ok(measurement),
            Some(Err(())) => Err(SensorError::InvalidFrame),
            None => {
                if let Some(flag) = &inner.stop_flag {
                    flag.store(false, Ordering::SeqCst);
                }
                Err(SensorError::InvalidFrame)
            }
        }
    }
}

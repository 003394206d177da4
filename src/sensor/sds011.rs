// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Blocking driver for the Nova Fitness SDS011 particulate matter sensor.
//!
//! The SDS011 talks a fixed-size frame protocol over 9600 8N1 serial:
//! commands are 19-byte frames addressed to the device, replies and streamed
//! data reports are 10-byte frames. Both directions carry a single-byte
//! additive checksum over the data bytes.

use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, warn};
use serialport::{DataBits, Parity, SerialPort, StopBits};

use super::{Measurement, SensorControl, SensorError};

const BAUD_RATE: u32 = 9600;
const FRAME_HEAD: u8 = 0xAA;
const FRAME_TAIL: u8 = 0xAB;
const COMMAND_ID: u8 = 0xB4;
const REPLY_ID: u8 = 0xC5;
const DATA_REPORT_ID: u8 = 0xC0;

const CMD_REPORTING_MODE: u8 = 0x02;
const CMD_QUERY_DATA: u8 = 0x04;
const CMD_WORKING_PERIOD: u8 = 0x08;

// Blocking reads must eventually return so the steady-state loop can log and
// retry; in active mode with a long cycle the port is simply quiet between
// data reports.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

// How many bytes to scan while re-synchronizing on a frame head, and how many
// complete frames to inspect while waiting for a specific reply.
const MAX_SYNC_BYTES: usize = 64;
const MAX_REPLY_FRAMES: usize = 8;

/// Driver handle for one SDS011 device on a serial port.
///
/// The port is owned exclusively by this handle and closed on drop.
#[derive(Debug)]
pub struct Sds011Sensor {
    port: Box<dyn SerialPort>,
}

impl Sds011Sensor {
    /// Open the serial device at `path` and configure it for the SDS011
    /// (9600 baud, 8 data bits, no parity, 1 stop bit).
    pub fn open(path: &str) -> Result<Self, SensorError> {
        debug!("Opening serial port {} at {} baud", path, BAUD_RATE);
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(Self { port })
    }

    // 19-byte command frame addressed to any device (0xFFFF), checksum and
    // tail filled in by `send_command`.
    fn base_command(command: u8) -> [u8; 19] {
        let mut frame = [0u8; 19];
        frame[0] = FRAME_HEAD;
        frame[1] = COMMAND_ID;
        frame[2] = command;
        frame[15] = 0xFF; // device id LSB, broadcast
        frame[16] = 0xFF; // device id MSB, broadcast
        frame[18] = FRAME_TAIL;
        frame
    }

    fn send_command(&mut self, mut frame: [u8; 19]) -> Result<(), SensorError> {
        let checksum = frame[2..=16]
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_add(b));
        frame[17] = checksum;
        debug!("Sending command frame: {:02X?}", frame);
        self.port.write_all(&frame)?;
        self.port.flush()?;
        Ok(())
    }

    // Read one 10-byte frame, scanning past garbage until a head byte with a
    // valid tail and checksum is found.
    fn read_frame(&mut self) -> Result<[u8; 10], SensorError> {
        let mut scanned = 0;
        while scanned < MAX_SYNC_BYTES {
            let mut head = [0u8; 1];
            self.port.read_exact(&mut head)?;
            scanned += 1;
            if head[0] != FRAME_HEAD {
                continue;
            }

            let mut rest = [0u8; 9];
            self.port.read_exact(&mut rest)?;
            scanned += rest.len();
            if rest[8] != FRAME_TAIL {
                debug!("Frame tail missing, resynchronizing: {:02X?}", rest);
                continue;
            }

            let mut frame = [0u8; 10];
            frame[0] = FRAME_HEAD;
            frame[1..].copy_from_slice(&rest);

            let checksum = frame[2..8].iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
            if checksum != frame[8] {
                warn!(
                    "Bad frame checksum: calculated {:02X}, received {:02X}, frame {:02X?}",
                    checksum, frame[8], frame
                );
                continue;
            }

            debug!("Received frame: {:02X?}", frame);
            return Ok(frame);
        }
        Err(SensorError::InvalidFrame)
    }

    // Wait for the reply acknowledging `command`, skipping any streamed data
    // reports that arrive in between.
    fn read_reply(&mut self, command: u8) -> Result<[u8; 10], SensorError> {
        for _ in 0..MAX_REPLY_FRAMES {
            let frame = self.read_frame()?;
            if frame[1] == REPLY_ID && frame[2] == command {
                return Ok(frame);
            }
            if frame[1] == DATA_REPORT_ID {
                debug!("Skipping interleaved data report while awaiting reply");
                continue;
            }
            warn!("Unexpected frame while awaiting reply: {:02X?}", frame);
        }
        Err(SensorError::CommandFailed)
    }

    fn set_reporting_mode(&mut self, passive: bool) -> Result<(), SensorError> {
        let mut frame = Self::base_command(CMD_REPORTING_MODE);
        frame[3] = 0x01; // set
        frame[4] = if passive { 0x01 } else { 0x00 };
        self.send_command(frame)?;

        let reply = self.read_reply(CMD_REPORTING_MODE)?;
        if reply[3] == 0x01 && reply[4] == frame[4] {
            Ok(())
        } else {
            warn!("Reporting mode not acknowledged: {:02X?}", reply);
            Err(SensorError::CommandFailed)
        }
    }
}

impl SensorControl for Sds011Sensor {
    fn set_passive_mode(&mut self) -> Result<(), SensorError> {
        self.set_reporting_mode(true)
    }

    fn set_active_mode(&mut self) -> Result<(), SensorError> {
        self.set_reporting_mode(false)
    }

    fn cycle(&mut self) -> Result<u8, SensorError> {
        let mut frame = Self::base_command(CMD_WORKING_PERIOD);
        frame[3] = 0x00; // query
        self.send_command(frame)?;

        let reply = self.read_reply(CMD_WORKING_PERIOD)?;
        Ok(reply[4])
    }

    fn set_cycle(&mut self, minutes: u8) -> Result<(), SensorError> {
        let mut frame = Self::base_command(CMD_WORKING_PERIOD);
        frame[3] = 0x01; // set
        frame[4] = minutes;
        self.send_command(frame)?;

        let reply = self.read_reply(CMD_WORKING_PERIOD)?;
        if reply[3] == 0x01 && reply[4] == minutes {
            Ok(())
        } else {
            warn!("Working period not acknowledged: {:02X?}", reply);
            Err(SensorError::CommandFailed)
        }
    }

    fn read_measurement(&mut self) -> Result<Measurement, SensorError> {
        // In active mode the sensor streams data reports on its own; wait for
        // the next one. A query reply (0xC5/0x04) carries the same payload one
        // byte later.
        for _ in 0..MAX_REPLY_FRAMES {
            let frame = self.read_frame()?;
            let payload = match frame[1] {
                DATA_REPORT_ID => &frame[2..6],
                REPLY_ID if frame[2] == CMD_QUERY_DATA => &frame[3..7],
                _ => {
                    debug!("Skipping non-data frame: {:02X?}", frame);
                    continue;
                }
            };

            let pm25 = u16::from_le_bytes([payload[0], payload[1]]) as f64 / 10.0;
            let pm10 = u16::from_le_bytes([payload[2], payload[3]]) as f64 / 10.0;
            return Ok(Measurement { pm25, pm10 });
        }
        Err(SensorError::InvalidFrame)
    }
}

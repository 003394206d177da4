//! SDS011 particulate matter exporter
//!
//! This library polls an SDS011 air quality sensor over a serial link and
//! republishes its PM2.5/PM10 readings as Prometheus gauges.

pub mod config;
pub mod controller;
pub mod daemon;
pub mod executor;
pub mod exporter;
pub mod metrics;
pub mod sensor;

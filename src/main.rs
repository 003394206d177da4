// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the SDS011 particulate matter exporter

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use rust_sds011_exporter::config::{utils::output_config_schema, Config};
use rust_sds011_exporter::daemon::Daemon;
use rust_sds011_exporter::metrics::MetricsSink;

/// Prometheus exporter for the SDS011 particulate matter sensor
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Address to listen on for web interface and telemetry
    #[arg(long = "web-address")]
    web_address: Option<String>,

    /// Port to listen on for web interface and telemetry
    #[arg(short = 'p', long = "web-port")]
    web_port: Option<u16>,

    /// Serial port path
    #[arg(long = "port-path")]
    port_path: Option<String>,

    /// Sensor cycle length in minutes
    #[arg(long)]
    cycle: Option<u8>,

    /// Force set cycle on every program start
    #[arg(long = "force-set-cycle")]
    force_set_cycle: Option<bool>,

    /// Use the built-in simulated sensor instead of real hardware
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Output the configuration schema as JSON and exit
    #[arg(long = "show-config-schema")]
    show_config_schema: bool,
}

// Structured JSON log lines on stdout, one object per record.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Off
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            use std::io::Write;
            let line = serde_json::json!({
                "time": chrono::Utc::now().to_rfc3339(),
                "level": record.level().as_str(),
                "target": record.target(),
                "msg": record.args().to_string(),
            });
            writeln!(buf, "{}", line)
        })
        .init();
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if args.show_config_schema {
        return output_config_schema();
    }

    if args.verbose {
        debug!("Debug logging enabled");
    }

    info!("Starting version {}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_file(&args.config)?;
    config.apply_args(
        args.web_address,
        args.web_port,
        args.port_path,
        args.cycle,
        args.force_set_cycle,
        args.simulate,
    );

    let sink = Arc::new(MetricsSink::new()?);

    let mut daemon = Daemon::new();
    daemon.launch(&config, sink).await?;
    daemon.join().await
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::Arc;

use rocket::http::Status;
use rocket::local::blocking::Client;

use rust_sds011_exporter::exporter::build_rocket;
use rust_sds011_exporter::metrics::MetricsSink;
use rust_sds011_exporter::sensor::Measurement;

fn test_client(sink: Arc<MetricsSink>) -> Client {
    let figment = rocket::Config::figment()
        .merge(("address", "127.0.0.1"))
        .merge(("port", 0))
        .merge(("log_level", rocket::config::LogLevel::Off));
    Client::tracked(build_rocket(figment, sink)).expect("rocket client")
}

#[test]
fn metrics_endpoint_serves_current_gauges() {
    let sink = Arc::new(MetricsSink::new().expect("metrics sink"));
    sink.record_measurement(&Measurement {
        pm25: 12.3,
        pm10: 20.1,
    });

    let client = test_client(sink);
    let response = client.get("/metrics").dispatch();

    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().expect("body");
    assert!(body.contains("airquality_pm{type=\"pm2.5\"} 12.3"));
    assert!(body.contains("airquality_pm{type=\"pm10\"} 20.1"));
}

#[test]
fn metrics_endpoint_reflects_overwrites() {
    let sink = Arc::new(MetricsSink::new().expect("metrics sink"));
    let client = test_client(sink.clone());

    sink.record_measurement(&Measurement {
        pm25: 1.0,
        pm10: 2.0,
    });
    let first = client.get("/metrics").dispatch().into_string().expect("body");
    assert!(first.contains("airquality_pm{type=\"pm2.5\"} 1"));

    sink.record_measurement(&Measurement {
        pm25: 3.5,
        pm10: 7.0,
    });
    let second = client.get("/metrics").dispatch().into_string().expect("body");
    assert!(second.contains("airquality_pm{type=\"pm2.5\"} 3.5"));
    assert!(second.contains("airquality_pm{type=\"pm10\"} 7"));
}

#[test]
fn index_page_links_to_metrics() {
    let sink = Arc::new(MetricsSink::new().expect("metrics sink"));
    let client = test_client(sink);

    let response = client.get("/").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().expect("body");
    assert!(body.contains("/metrics"));
}

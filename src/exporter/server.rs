// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sds011-exporter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::Arc;

use log::error;
use rocket::figment::Figment;
use rocket::http::{ContentType, Status};
use rocket::{get, routes, Build, Rocket, State};

use crate::metrics::MetricsSink;

/// Landing page pointing at the metrics path.
#[get("/")]
fn index() -> (ContentType, &'static str) {
    (
        ContentType::HTML,
        "<html><head><title>SDS011 Exporter</title></head>\
         <body><h1>SDS011 Exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>",
    )
}

/// Current gauge values in the Prometheus text exposition format.
#[get("/metrics")]
fn metrics(sink: &State<Arc<MetricsSink>>) -> Result<(ContentType, String), Status> {
    match sink.render() {
        Ok(body) => {
            let content_type =
                ContentType::parse_flexible(sink.format_type()).unwrap_or(ContentType::Plain);
            Ok((content_type, body))
        }
        Err(err) => {
            error!("Failed to render metrics: {}", err);
            Err(Status::InternalServerError)
        }
    }
}

/// Assemble the Rocket instance serving the metrics endpoint.
pub fn build_rocket(figment: Figment, sink: Arc<MetricsSink>) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", routes![index, metrics])
        .manage(sink)
}

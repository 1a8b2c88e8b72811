//! Tracing and OTLP export setup.
//!
//! The exporter target comes from `OTEL_EXPORTER_OTLP_ENDPOINT` (gRPC,
//! defaulting to the collector's standard local port). The tracer provider is
//! kept around so [`shutdown`] can flush pending spans on exit.

use anyhow::Result;
use once_cell::sync::OnceCell;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime,
    trace::{Tracer, TracerProvider},
    Resource,
};
use std::{env, time::Duration};
use tracing::Level;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static TRACER_PROVIDER: OnceCell<TracerProvider> = OnceCell::new();

const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn normalize_endpoint(endpoint: String) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint
    } else {
        // gRPC exporters need a scheme; plain host:port gets http
        format!("http://{}", endpoint.trim_end_matches('/'))
    }
}

fn otlp_endpoint() -> String {
    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| DEFAULT_OTLP_ENDPOINT.to_string());

    normalize_endpoint(endpoint)
}

fn build_tracer() -> Result<Tracer> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_endpoint())
        .with_timeout(Duration::from_secs(3))
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![
            KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build();

    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));

    global::set_text_map_propagator(TraceContextPropagator::new());

    let _ = TRACER_PROVIDER.set(provider);

    Ok(tracer)
}

/// Install the global subscriber: fmt layer, env filter and OTLP export.
/// # Errors
/// Returns an error if the exporter cannot be built or a subscriber is
/// already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let tracer = build_tracer()?;

    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    // RUST_LOG overrides the -v flag
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level(verbosity).into())
        .from_env_lossy();

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(OpenTelemetryLayer::new(tracer))
        .with(env_filter);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush and shut down the tracer provider, if one was installed.
pub fn shutdown() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(error) = provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {error:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log_level(0), Level::ERROR);
        assert_eq!(log_level(1), Level::WARN);
        assert_eq!(log_level(2), Level::INFO);
        assert_eq!(log_level(3), Level::DEBUG);
        assert_eq!(log_level(4), Level::TRACE);
        assert_eq!(log_level(255), Level::TRACE);
    }

    #[test]
    fn test_normalize_endpoint_keeps_scheme() {
        assert_eq!(
            normalize_endpoint("http://localhost:4317".to_string()),
            "http://localhost:4317"
        );
        assert_eq!(
            normalize_endpoint("https://otel.example.com:4317".to_string()),
            "https://otel.example.com:4317"
        );
    }

    #[test]
    fn test_normalize_endpoint_adds_scheme() {
        assert_eq!(
            normalize_endpoint("localhost:4317".to_string()),
            "http://localhost:4317"
        );
        assert_eq!(
            normalize_endpoint("otel.example.com:4317/".to_string()),
            "http://otel.example.com:4317"
        );
    }

    #[test]
    fn test_otlp_endpoint_default() {
        temp_env::with_var("OTEL_EXPORTER_OTLP_ENDPOINT", None::<&str>, || {
            assert_eq!(otlp_endpoint(), DEFAULT_OTLP_ENDPOINT);
        });
    }

    #[test]
    fn test_otlp_endpoint_from_env() {
        temp_env::with_var("OTEL_EXPORTER_OTLP_ENDPOINT", Some("collector:4317"), || {
            assert_eq!(otlp_endpoint(), "http://collector:4317");
        });
    }
}

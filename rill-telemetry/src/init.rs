//! Subscriber and exporter setup.
//!
//! Initialization is idempotent: only the first successful call installs the
//! global subscriber. Setup failures are returned to the caller rather than
//! panicking the host pipeline.

use std::sync::Once;

use opentelemetry::KeyValue;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

fn env_filter() -> Result<EnvFilter, Box<dyn std::error::Error>> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?)
}

/// Initialize console logging for the given service.
pub fn init(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = env_filter()?;
    let mut result = Ok(());

    INIT.call_once(|| {
        result = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .map_err(Into::into);
        if result.is_ok() {
            tracing::info!(service.name = service_name, "telemetry initialized");
        }
    });

    result
}

/// Initialize console logging plus span export to an OTLP collector.
///
/// Spans are exported in batches on the tokio runtime; call from within one.
/// Pair with [`shutdown`] before process exit so buffered spans flush.
pub fn init_otlp(service_name: &str, endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    use opentelemetry_otlp::WithExportConfig;

    let filter = env_filter()?;
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
            opentelemetry_sdk::Resource::new(vec![KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let mut result = Ok(());
    INIT.call_once(|| {
        result = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
            .try_init()
            .map_err(Into::into);
        if result.is_ok() {
            tracing::info!(
                service.name = service_name,
                otlp.endpoint = endpoint,
                "telemetry initialized with OTLP export"
            );
        }
    });

    result
}

/// Flush pending spans and shut the global provider down.
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

//! OpenTelemetry-based observability bootstrap, shared by every gentable
//! process (server, CLI, background workers).

use opentelemetry::{global, trace::TracerProvider, KeyValue};
use opentelemetry_sdk::{metrics::SdkMeterProvider, trace::SdkTracerProvider, Resource};
use opentelemetry_stdout::SpanExporter;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Exporter backend for traces and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterBackend {
    /// Export to stdout (development/debugging).
    Stdout,
    /// Export via OTLP to a collector (production).
    #[cfg(feature = "otel-otlp")]
    Otlp {
        /// OTLP endpoint (e.g., "http://localhost:4317").
        endpoint: String,
    },
}

impl ExporterBackend {
    /// Parse an exporter backend from the `OTEL_EXPORTER` /
    /// `OTEL_EXPORTER_OTLP_ENDPOINT` environment variables.
    ///
    /// - `"stdout"` → Stdout (default if unset)
    /// - `"otlp"` → Otlp (requires the `otel-otlp` feature)
    pub fn from_env() -> Self {
        match env::var("OTEL_EXPORTER")
            .unwrap_or_else(|_| "stdout".to_string())
            .to_lowercase()
            .as_str()
        {
            #[cfg(feature = "otel-otlp")]
            "otlp" => {
                let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:4317".to_string());
                Self::Otlp { endpoint }
            }
            _ => Self::Stdout,
        }
    }
}

impl Default for ExporterBackend {
    fn default() -> Self {
        Self::Stdout
    }
}

/// Configuration for the observability stack.
///
/// # Examples
///
/// ```
/// use gentable_core::ObservabilityConfig;
///
/// let cfg = ObservabilityConfig::new("gentable-server")
///     .with_log_level("debug")
///     .with_json_logs(true);
/// assert_eq!(cfg.service_name, "gentable-server");
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution.
    pub service_name: String,
    /// Service version.
    pub service_version: String,
    /// Log level filter (e.g., "info", "debug").
    pub log_level: String,
    /// Emit JSON-formatted logs for structured ingestion.
    pub json_logs: bool,
    /// Exporter backend for traces and metrics.
    pub exporter: ExporterBackend,
    /// Enable metrics collection.
    pub enable_metrics: bool,
}

impl ObservabilityConfig {
    /// Create a new configuration with the given service name.
    ///
    /// Defaults: exporter from `OTEL_EXPORTER` (stdout), log level from
    /// `RUST_LOG` (info), text logs, metrics enabled.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json_logs: false,
            exporter: ExporterBackend::from_env(),
            enable_metrics: true,
        }
    }

    /// Set the service version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Set the exporter backend.
    pub fn with_exporter(mut self, exporter: ExporterBackend) -> Self {
        self.exporter = exporter;
        self
    }

    /// Enable or disable metrics collection.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Initialize the observability stack with default configuration.
pub fn init_observability() -> Result<(), Box<dyn std::error::Error>> {
    init_observability_with_config(ObservabilityConfig::default())
}

/// Initialize the observability stack: tracing with an OpenTelemetry bridge,
/// the configured exporter backend, and a `tracing-subscriber` registry
/// combining an env filter, an fmt layer, and the OTel layer.
pub fn init_observability_with_config(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes(vec![KeyValue::new(
            "service.version",
            config.service_version.clone(),
        )])
        .build();

    let provider = match &config.exporter {
        ExporterBackend::Stdout => {
            let exporter = SpanExporter::default();
            SdkTracerProvider::builder()
                .with_simple_exporter(exporter)
                .with_resource(resource.clone())
                .build()
        }
        #[cfg(feature = "otel-otlp")]
        ExporterBackend::Otlp { endpoint } => {
            use opentelemetry_otlp::WithExportConfig;

            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()
                .map_err(|e| format!("failed to build OTLP span exporter: {e}"))?;

            SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_resource(resource.clone())
                .build()
        }
    };

    global::set_tracer_provider(provider.clone());

    if config.enable_metrics {
        init_metrics(&resource, &config)?;
    }

    let tracer = provider.tracer(config.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Ok(())
}

fn init_metrics(
    resource: &Resource,
    config: &ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match &config.exporter {
        ExporterBackend::Stdout => {
            let exporter = opentelemetry_stdout::MetricExporter::default();
            let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter).build();
            let meter_provider = SdkMeterProvider::builder()
                .with_reader(reader)
                .with_resource(resource.clone())
                .build();
            global::set_meter_provider(meter_provider);
        }
        #[cfg(feature = "otel-otlp")]
        ExporterBackend::Otlp { endpoint } => {
            use opentelemetry_otlp::WithExportConfig;

            let exporter = opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint.clone())
                .build()
                .map_err(|e| format!("failed to build OTLP metric exporter: {e}"))?;

            let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter).build();
            let meter_provider = SdkMeterProvider::builder()
                .with_reader(reader)
                .with_resource(resource.clone())
                .build();
            global::set_meter_provider(meter_provider);
        }
    }
    Ok(())
}

/// Shut down OpenTelemetry gracefully.
///
/// Providers flush on drop in SDK v0.31+; this exists for API symmetry with
/// `init_observability` and as the hook callers should run at process exit.
pub fn shutdown_observability() {}

//! Tracing/OpenTelemetry pipeline bootstrap, reusing
//! [`gentable_core::observability`] rather than standing up a second
//! pipeline: this module only translates [`ObservabilitySettings`] into
//! the `gentable_core` config type and forwards to it.

use crate::config::{ExporterSettings, ObservabilitySettings};
use gentable_core::observability::{ExporterBackend, ObservabilityConfig};
use gentable_error::{ServerError, ServerErrorKind};

/// Guard returned by [`init`]; drop it (or call [`shutdown`]) at process
/// exit to flush any buffered spans/metrics.
pub struct ObservabilityGuard;

/// Initialize tracing (and, if enabled, metrics) from `settings`.
pub fn init(settings: &ObservabilitySettings) -> Result<ObservabilityGuard, ServerError> {
    let exporter = match settings.exporter {
        ExporterSettings::Stdout => ExporterBackend::Stdout,
        ExporterSettings::Otlp => {
            let endpoint = settings.otlp_endpoint.clone().ok_or_else(|| {
                ServerError::new(ServerErrorKind::Configuration(
                    "observability.exporter = \"otlp\" requires observability.otlp_endpoint".to_string(),
                ))
            })?;
            ExporterBackend::Otlp { endpoint }
        }
    };

    let config = ObservabilityConfig::new(settings.service_name.clone())
        .with_log_level(settings.log_level.clone())
        .with_json_logs(settings.json_logs)
        .with_exporter(exporter)
        .with_metrics(settings.enable_metrics);

    gentable_core::observability::init_observability_with_config(config).map_err(|err| {
        ServerError::new(ServerErrorKind::InitFailed { component: "observability".to_string(), reason: err.to_string() })
    })?;

    Ok(ObservabilityGuard)
}

/// Flush and tear down the observability pipeline.
pub fn shutdown(_guard: ObservabilityGuard) {
    gentable_core::observability::shutdown_observability();
}

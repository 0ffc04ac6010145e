//! Bootstrap configuration: layered TOML (bundled defaults + user
//! override) plus environment-variable overrides for secrets, the way
//! [`gentable_quota::PricingConfig`] loads billing plans.

use gentable_error::{ConfigError, GentableError, GentableResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Caps the Python sandbox enforces on one `PythonGen` invocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SandboxSettings {
    /// Path or name of the Python 3 interpreter to spawn.
    #[serde(default = "default_python_path")]
    pub python_path: String,
    /// Wall-clock budget per invocation, in seconds.
    #[serde(default = "default_sandbox_time_budget_secs")]
    pub time_budget_secs: u64,
    /// Address-space budget per invocation, in MiB.
    #[serde(default = "default_sandbox_memory_budget_mib")]
    pub memory_budget_mib: u64,
    /// Captured stdout is truncated to this many bytes.
    #[serde(default = "default_sandbox_stdout_cap_bytes")]
    pub stdout_cap_bytes: usize,
}

fn default_python_path() -> String {
    "python3".to_string()
}
fn default_sandbox_time_budget_secs() -> u64 {
    120
}
fn default_sandbox_memory_budget_mib() -> u64 {
    256
}
fn default_sandbox_stdout_cap_bytes() -> usize {
    64 * 1024
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            python_path: default_python_path(),
            time_budget_secs: default_sandbox_time_budget_secs(),
            memory_budget_mib: default_sandbox_memory_budget_mib(),
            stdout_cap_bytes: default_sandbox_stdout_cap_bytes(),
        }
    }
}

/// Backend to export traces/metrics to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExporterSettings {
    /// Print spans/metrics to stdout. The default — no collector required.
    Stdout,
    /// Export via OTLP to `otlp_endpoint`.
    Otlp,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self::Stdout
    }
}

/// Observability bootstrap settings (spec §0: "optional OpenTelemetry
/// export behind a feature flag on `gentable_server`").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ObservabilitySettings {
    /// Service name attached to every span/log line.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit structured JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
    /// Which backend to export to.
    #[serde(default)]
    pub exporter: ExporterSettings,
    /// OTLP collector endpoint, required when `exporter == Otlp`.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// Initialize the metrics pipeline alongside tracing.
    #[serde(default)]
    pub enable_metrics: bool,
}

fn default_service_name() -> String {
    "gentable".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Everything a bootstrapped process needs to wire its backends and
/// observability pipeline. Non-secret fields load from layered TOML;
/// `gemini_api_key` and `database_url` are read from the environment so
/// they never land in a checked-in config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Gemini API key. Read from the `GENTABLE_GEMINI_API_KEY`
    /// environment variable, never from TOML.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Chat/generation model id, e.g. `"gemini-2.5-flash"`.
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Embedding model id, e.g. `"text-embedding-004"`.
    #[serde(default = "default_gemini_embedding_model")]
    pub gemini_embedding_model: String,
    /// Output dimensionality of `gemini_embedding_model`.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    /// Default per-request cell budget `C` when a request doesn't
    /// override it.
    #[serde(default = "default_cell_budget")]
    pub cell_budget: u32,
    /// Filesystem root for media blob storage.
    #[serde(default = "default_media_storage_path")]
    pub media_storage_path: String,
    /// How often the background task flushes buffered usage events to
    /// durable storage.
    #[serde(default = "default_usage_flush_interval_secs")]
    pub usage_flush_interval_secs: u64,
    /// Postgres connection string for `gentable_database`. Read from the
    /// `DATABASE_URL` environment variable; absent disables durable
    /// persistence and runs with the in-memory cache layer only.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Python sandbox resource caps.
    #[serde(default)]
    pub sandbox: SandboxSettings,
    /// Observability pipeline settings.
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_gemini_embedding_model() -> String {
    "text-embedding-004".to_string()
}
fn default_embedding_dimensions() -> u32 {
    768
}
fn default_cell_budget() -> u32 {
    gentable_core::DEFAULT_CELL_BUDGET
}
fn default_media_storage_path() -> String {
    "./gentable-media".to_string()
}
fn default_usage_flush_interval_secs() -> u64 {
    30
}

impl ServerConfig {
    /// Load configuration with precedence: environment variables (secrets
    /// and ad hoc overrides) > current-directory override > home-directory
    /// override > bundled defaults. User config files are optional and
    /// silently skipped if absent.
    #[instrument]
    pub fn load() -> GentableResult<Self> {
        debug!("loading server configuration: env > cwd > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../gentable_server.toml");

        let mut builder =
            ::config::Config::builder().add_source(::config::File::from_str(DEFAULT_CONFIG, ::config::FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/gentable/gentable_server.toml");
            builder = builder.add_source(::config::File::from(home_config).required(false));
        }
        builder = builder.add_source(::config::File::with_name("gentable_server").required(false));
        builder = builder.add_source(::config::Environment::with_prefix("GENTABLE").separator("_"));

        let mut config: Self = builder
            .build()
            .map_err(|e| GentableError::from(ConfigError::new(format!("failed to build server configuration: {e}"))))?
            .try_deserialize()
            .map_err(|e| GentableError::from(ConfigError::new(format!("failed to parse server configuration: {e}"))))?;

        if config.database_url.is_none() {
            config.database_url = std::env::var("DATABASE_URL").ok();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_settings_default_matches_sandbox_crate_defaults() {
        let settings = SandboxSettings::default();
        assert_eq!(settings.python_path, "python3");
        assert_eq!(settings.time_budget_secs, 120);
        assert_eq!(settings.memory_budget_mib, 256);
        assert_eq!(settings.stdout_cap_bytes, 64 * 1024);
    }

    #[test]
    fn observability_settings_default_to_stdout_export() {
        let settings = ObservabilitySettings::default();
        assert_eq!(settings.exporter, ExporterSettings::Stdout);
        assert!(!settings.enable_metrics);
    }
}

use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    #[command(flatten)]
    pub validation: ValidationConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "CONTACT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CONTACT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management server (health probes)
    #[arg(long, env = "CONTACT_MGMT_PORT", default_value_t = 3001)]
    pub mgmt_port: u16,

    /// Seconds to wait for in-flight work before exiting on shutdown
    #[arg(long, env = "CONTACT_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Directory holding the contact form front-end, served for unmatched paths
    #[arg(long, env = "CONTACT_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct StorageConfig {
    /// Path of the JSON file holding all submissions
    #[arg(long, env = "CONTACT_DATA_FILE", default_value = "submissions.json")]
    pub data_file: PathBuf,

    /// What to do when the data file exists but cannot be parsed
    #[arg(long, env = "CONTACT_CORRUPT_DATA", value_enum, default_value_t = CorruptDataPolicy::Fail)]
    pub corrupt_data: CorruptDataPolicy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CorruptDataPolicy {
    /// Refuse to read or write until an operator repairs the file
    #[default]
    Fail,
    /// Move the unreadable file aside and continue with an empty collection
    Quarantine,
}

#[derive(Clone, Debug, Args)]
pub struct ValidationConfig {
    /// Enforce the form's minimum name and message lengths on the server too
    #[arg(long = "strict-validation", env = "CONTACT_STRICT_VALIDATION", default_value_t = false)]
    pub strict: bool,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the storage readiness check in milliseconds
    #[arg(long, env = "CONTACT_HEALTH_STORAGE_TIMEOUT_MS", default_value_t = 2000)]
    pub storage_timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "CONTACT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint (gRPC). Export is disabled when unset.
    #[arg(long, env = "CONTACT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

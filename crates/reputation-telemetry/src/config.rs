//! Telemetry configuration from environment variables.

use std::env;

/// Default service name reported in logs and traces.
pub const DEFAULT_SERVICE_NAME: &str = "miner-reputation";

/// Configuration for logging, tracing and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// OpenTelemetry OTLP endpoint. Trace export is off when unset.
    pub otlp_endpoint: Option<String>,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Network identifier (mainnet, calibnet, devnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "mainnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: miner-reputation)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: unset, no export)
    /// - `REP_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `REP_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `REP_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `REP_NETWORK`: Network name (default: mainnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),

            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            log_level: env::var("REP_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("REP_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("REP_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            network: env::var("REP_NETWORK").unwrap_or_else(|_| "mainnet".to_string()),
        }
    }

    /// Whether spans are exported over OTLP. A blank endpoint disables export.
    pub fn exports_traces(&self) -> bool {
        self.otlp_endpoint
            .as_deref()
            .is_some_and(|endpoint| !endpoint.trim().is_empty())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "miner-reputation");
        assert_eq!(config.log_level, "info");
        assert!(!config.exports_traces());
        assert!(config.console_output);
    }

    #[test]
    fn test_blank_endpoint_disables_export() {
        let mut config = TelemetryConfig {
            otlp_endpoint: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!config.exports_traces());

        config.otlp_endpoint = Some("http://localhost:4317".to_string());
        assert!(config.exports_traces());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}

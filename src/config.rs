//! Configuration loading and constants.
//!
//! Loads the server configuration from a TOML file. `AppConfig` is the root
//! struct; the `[http]` table selects the address, timeout preset and TLS mode,
//! `[shutdown]` holds the graceful shutdown deadline.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::http::{GracefulServer, ShutdownDeadline};

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "graceful_http=debug,tower_http=debug";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Apply the recommended read/write/idle timeouts
    #[serde(default)]
    pub cloudflare_timeouts: bool,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl HttpServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Validation(format!("Invalid http.host or http.port: {}", e)))
    }
}

/// TLS mode for the HTTP server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain HTTP
    #[default]
    None,
    /// Certificate and key loaded from PEM files
    Manual,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TlsMode,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    /// Restrict TLS to the recommended versions, curves and cipher suites
    #[serde(default)]
    pub cloudflare: bool,
}

impl TlsConfig {
    /// Certificate and key paths when TLS is enabled.
    pub fn files(&self) -> Option<(&Path, &Path)> {
        match (self.mode, &self.cert_path, &self.key_path) {
            (TlsMode::Manual, Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

/// Graceful shutdown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// Drain deadline in seconds. Zero or negative uses the default (5).
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_seconds: i64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Self::default_timeout(),
        }
    }
}

impl ShutdownConfig {
    fn default_timeout() -> i64 {
        5
    }

    pub fn deadline(&self) -> ShutdownDeadline {
        ShutdownDeadline::from_secs(self.timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;

        if config.http.tls.mode == TlsMode::Manual && config.http.tls.files().is_none() {
            return Err(ConfigError::Validation(
                "http.tls.mode = \"manual\" requires cert_path and key_path".to_string(),
            ));
        }

        config.http.addr()?;

        Ok(config)
    }

    /// Apply the configured address, timeouts and shutdown deadline to a router.
    pub fn build_server(&self, router: axum::Router) -> Result<GracefulServer, ConfigError> {
        let mut server = GracefulServer::bind(self.http.addr()?, router)
            .with_shutdown_timeout(self.shutdown.deadline());

        if self.http.cloudflare_timeouts {
            server = server.with_cloudflare_timeouts();
        }
        if self.http.tls.cloudflare {
            server = server.with_cloudflare_tls();
        }

        Ok(server)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const MINIMAL: &str = r#"
        [http]
        host = "127.0.0.1"
        port = 8080
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::parse(MINIMAL).unwrap();

        assert_eq!(config.http.addr().unwrap().port(), 8080);
        assert!(!config.http.cloudflare_timeouts);
        assert_eq!(config.http.tls.mode, TlsMode::None);
        assert_eq!(config.shutdown.deadline().as_duration(), Duration::from_secs(5));
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn negative_timeout_clamps_to_default() {
        let toml = format!("{MINIMAL}\n[shutdown]\ntimeout_seconds = -3\n");
        let config = AppConfig::parse(&toml).unwrap();
        assert_eq!(config.shutdown.deadline(), ShutdownDeadline::default());

        let toml = format!("{MINIMAL}\n[shutdown]\ntimeout_seconds = 30\n");
        let config = AppConfig::parse(&toml).unwrap();
        assert_eq!(config.shutdown.deadline().as_duration(), Duration::from_secs(30));
    }

    #[test]
    fn manual_tls_requires_both_paths() {
        let toml = r#"
            [http]
            host = "0.0.0.0"
            port = 8443

            [http.tls]
            mode = "manual"
            cert_path = "cert.pem"
        "#;
        assert!(matches!(AppConfig::parse(toml), Err(ConfigError::Validation(_))));

        let toml = format!("{toml}key_path = \"key.pem\"\n");
        let config = AppConfig::parse(&toml).unwrap();
        let (cert, key) = config.http.tls.files().unwrap();
        assert_eq!(cert, Path::new("cert.pem"));
        assert_eq!(key, Path::new("key.pem"));
    }

    #[test]
    fn invalid_host_is_rejected() {
        let toml = r#"
            [http]
            host = "not a host"
            port = 80
        "#;
        assert!(matches!(AppConfig::parse(toml), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL}\n[logging]\nformat = \"json\"\n").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.format, "json");

        assert!(matches!(
            AppConfig::load(file.path().with_extension("missing")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn build_server_applies_settings() {
        let toml = format!("{MINIMAL}\ncloudflare_timeouts = true\n[shutdown]\ntimeout_seconds = 9\n");
        let config = AppConfig::parse(&toml).unwrap();

        let server = config.build_server(axum::Router::new()).unwrap();
        assert_eq!(server.shutdown_timeout().as_duration(), Duration::from_secs(9));
        assert_eq!(server.addr().port(), 8080);
    }
}

//! Server options: shutdown deadline, HTTP timeouts and TLS settings.
//!
//! Defaults follow the recommendations from
//! <https://blog.cloudflare.com/exposing-go-on-the-internet/>. The tables here are
//! never mutated; they are applied through the builder methods on
//! [`GracefulServer`](super::GracefulServer).

use std::fmt;
use std::time::Duration;

use rustls::crypto::aws_lc_rs::{cipher_suite, kx_group};
use rustls::crypto::SupportedKxGroup;
use rustls::SupportedCipherSuite;

// =============================================================================
// Defaults
// =============================================================================

/// Deadline for a graceful drain before connections are force-closed
pub const DEFAULT_GRACEFUL_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum duration for reading the entire request, including the body
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum duration before timing out writes of the response
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum time to wait for the next request when keep-alive is enabled
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Time allowed to read request headers
pub const DEFAULT_READ_HEADER_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Shutdown deadline
// =============================================================================

/// How long a graceful drain may take before outstanding connections are
/// force-closed.
///
/// Zero and negative inputs are clamped to [`DEFAULT_GRACEFUL_TIMEOUT`]; there is
/// no way to express "wait forever".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownDeadline(Duration);

impl ShutdownDeadline {
    /// Create a deadline, using the default when `duration` is zero.
    pub fn new(duration: Duration) -> Self {
        if duration.is_zero() {
            Self::default()
        } else {
            Self(duration)
        }
    }

    /// Create a deadline from signed seconds. Non-positive values use the default.
    pub fn from_secs(secs: i64) -> Self {
        if secs <= 0 {
            Self::default()
        } else {
            Self(Duration::from_secs(secs.unsigned_abs()))
        }
    }

    /// Create a deadline from signed milliseconds. Non-positive values use the default.
    pub fn from_millis(millis: i64) -> Self {
        if millis <= 0 {
            Self::default()
        } else {
            Self(Duration::from_millis(millis.unsigned_abs()))
        }
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for ShutdownDeadline {
    fn default() -> Self {
        Self(DEFAULT_GRACEFUL_TIMEOUT)
    }
}

impl From<Duration> for ShutdownDeadline {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}

// =============================================================================
// HTTP timeouts
// =============================================================================

/// Per-connection HTTP timeouts, forwarded to hyper and tower-http at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Longest pause allowed between request body chunks. Also the header
    /// timeout when `read_header` is unset.
    pub read: Option<Duration>,
    /// Time allowed to receive the request headers (HTTP/1 only).
    pub read_header: Option<Duration>,
    /// Upper bound on producing the response; exceeding it answers 408.
    pub write: Option<Duration>,
    /// Keep-alive idle time. Only `Some(Duration::ZERO)` has an effect: it
    /// disables HTTP/1 keep-alive. hyper has no idle timer, so other values
    /// leave idle connections open until the peer or a shutdown closes them.
    pub idle: Option<Duration>,
}

impl HttpTimeouts {
    /// Timeouts recommended for servers exposed directly to the internet.
    pub const fn cloudflare() -> Self {
        Self {
            read: Some(DEFAULT_READ_TIMEOUT),
            read_header: Some(DEFAULT_READ_HEADER_TIMEOUT),
            write: Some(DEFAULT_WRITE_TIMEOUT),
            idle: Some(DEFAULT_IDLE_TIMEOUT),
        }
    }

    /// Header read timeout hyper should enforce.
    pub fn header_read_timeout(&self) -> Option<Duration> {
        self.read_header.or(self.read)
    }

    /// Whether HTTP/1 keep-alive stays enabled.
    pub fn keep_alive(&self) -> bool {
        self.idle != Some(Duration::ZERO)
    }
}

// =============================================================================
// TLS settings
// =============================================================================

/// Lowest TLS protocol version the server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsVersion {
    #[default]
    Tls12,
    Tls13,
}

static TLS13_ONLY: &[&rustls::SupportedProtocolVersion] = &[&rustls::version::TLS13];

impl TlsVersion {
    pub(crate) fn protocol_versions(&self) -> &'static [&'static rustls::SupportedProtocolVersion] {
        match self {
            TlsVersion::Tls12 => rustls::ALL_VERSIONS,
            TlsVersion::Tls13 => TLS13_ONLY,
        }
    }
}

/// TLS parameters used to build the rustls server configuration.
///
/// `cipher_suites` should keep the TLS 1.3 suites when 1.3 is enabled; rustls
/// refuses a configuration with no usable suite for an enabled version.
#[derive(Clone)]
pub struct TlsSettings {
    pub min_version: TlsVersion,
    /// Key exchange groups in preference order.
    pub kx_groups: Vec<&'static dyn SupportedKxGroup>,
    /// Cipher suites in preference order.
    pub cipher_suites: Vec<SupportedCipherSuite>,
}

impl TlsSettings {
    /// TLS 1.2 minimum, curves with assembly implementations and forward-secret
    /// AEAD cipher suites only.
    pub fn cloudflare() -> Self {
        Self {
            min_version: TlsVersion::Tls12,
            // P-256 first, then X25519
            kx_groups: vec![kx_group::SECP256R1, kx_group::X25519],
            cipher_suites: vec![
                cipher_suite::TLS13_AES_256_GCM_SHA384,
                cipher_suite::TLS13_AES_128_GCM_SHA256,
                cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
                cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
                cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
                cipher_suite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
                cipher_suite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
                cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
                cipher_suite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            ],
        }
    }
}

impl Default for TlsSettings {
    /// The stock aws-lc-rs provider with TLS 1.2 and 1.3 enabled.
    fn default() -> Self {
        let provider = rustls::crypto::aws_lc_rs::default_provider();
        Self {
            min_version: TlsVersion::Tls12,
            kx_groups: provider.kx_groups,
            cipher_suites: provider.cipher_suites,
        }
    }
}

impl fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSettings")
            .field("min_version", &self.min_version)
            .field(
                "kx_groups",
                &self.kx_groups.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field(
                "cipher_suites",
                &self.cipher_suites.iter().map(|s| s.suite()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_clamps_non_positive_values() {
        for secs in [0, -1, -30, i64::MIN] {
            assert_eq!(ShutdownDeadline::from_secs(secs).as_duration(), DEFAULT_GRACEFUL_TIMEOUT);
        }
        for millis in [0, -1, -5000] {
            assert_eq!(ShutdownDeadline::from_millis(millis).as_duration(), DEFAULT_GRACEFUL_TIMEOUT);
        }
        assert_eq!(ShutdownDeadline::new(Duration::ZERO), ShutdownDeadline::default());
    }

    #[test]
    fn deadline_keeps_positive_values() {
        assert_eq!(ShutdownDeadline::from_secs(1).as_duration(), Duration::from_secs(1));
        assert_eq!(ShutdownDeadline::from_secs(60).as_duration(), Duration::from_secs(60));
        assert_eq!(ShutdownDeadline::from_millis(250).as_duration(), Duration::from_millis(250));
        assert_eq!(
            ShutdownDeadline::from(Duration::from_nanos(1)).as_duration(),
            Duration::from_nanos(1)
        );
    }

    #[test]
    fn header_timeout_falls_back_to_read_timeout() {
        let timeouts = HttpTimeouts {
            read: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        assert_eq!(timeouts.header_read_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(
            HttpTimeouts::cloudflare().header_read_timeout(),
            Some(DEFAULT_READ_HEADER_TIMEOUT)
        );
        assert_eq!(HttpTimeouts::default().header_read_timeout(), None);
    }

    #[test]
    fn zero_idle_disables_keep_alive() {
        assert!(HttpTimeouts::default().keep_alive());
        assert!(HttpTimeouts::cloudflare().keep_alive());
        let timeouts = HttpTimeouts {
            idle: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(!timeouts.keep_alive());
    }

    #[test]
    fn cloudflare_tls_prefers_p256() {
        let settings = TlsSettings::cloudflare();
        assert_eq!(settings.min_version, TlsVersion::Tls12);
        assert_eq!(settings.kx_groups[0].name(), rustls::NamedGroup::secp256r1);
        assert_eq!(settings.kx_groups[1].name(), rustls::NamedGroup::X25519);
        assert_eq!(settings.cipher_suites.len(), 9);
        assert_eq!(TlsVersion::Tls13.protocol_versions().len(), 1);
    }
}

// Error types for certmonitor
//
// Structured error types using thiserror. Configuration and schedule errors are
// fatal at startup; fetch errors are recoverable and scoped to a single site.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Main error type for certmonitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Malformed or missing configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Schedule expression could not be parsed
    #[error("Invalid schedule expression {expression:?}: {reason}")]
    Schedule { expression: String, reason: String },

    /// Site address could not be turned into a host and port
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Fetch did not complete within the configured timeout
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Connection was refused by the remote host
    #[error("Connection refused by {addr}")]
    ConnectionRefused { addr: SocketAddr },

    /// DNS resolution failed for the hostname
    #[error("DNS resolution failed for {hostname}: {source}")]
    DnsResolutionFailed {
        hostname: String,
        #[source]
        source: io::Error,
    },

    /// TLS handshake failed
    #[error("Invalid TLS handshake: {details}")]
    InvalidHandshake { details: String },

    /// Server completed the handshake without presenting certificates
    #[error("No certificates received from {address}")]
    NoCertificates { address: String },

    /// DER certificate could not be parsed
    #[error("Certificate parsing error: {details}")]
    CertificateParse { details: String },

    /// Alert channel delivery failure
    #[error("Alert channel {channel} failed: {details}")]
    Alert { channel: String, details: String },

    /// Generic I/O error
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// Reqwest HTTP client errors
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// TOML deserialization errors
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl MonitorError {
    /// Whether this error belongs to a single site's fetch and should be
    /// skipped for the current tick rather than aborting the process
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            MonitorError::Timeout { .. }
                | MonitorError::ConnectionRefused { .. }
                | MonitorError::DnsResolutionFailed { .. }
                | MonitorError::InvalidHandshake { .. }
                | MonitorError::NoCertificates { .. }
                | MonitorError::InvalidAddress { .. }
                | MonitorError::CertificateParse { .. }
                | MonitorError::IoError { .. }
        )
    }

    /// Whether this error must stop startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::Config { .. } | MonitorError::Schedule { .. }
        )
    }
}

/// Conversion from anyhow::Error for context-heavy call sites
impl From<anyhow::Error> for MonitorError {
    fn from(err: anyhow::Error) -> Self {
        MonitorError::Other(err.to_string())
    }
}

impl From<rustls::Error> for MonitorError {
    fn from(err: rustls::Error) -> Self {
        MonitorError::InvalidHandshake {
            details: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for MonitorError {
    fn from(err: tokio::task::JoinError) -> Self {
        MonitorError::Other(format!("Task join error: {}", err))
    }
}

impl From<toml::ser::Error> for MonitorError {
    fn from(err: toml::ser::Error) -> Self {
        MonitorError::Other(format!("TOML serialization error: {}", err))
    }
}

/// Helper macro for bailing out with a configuration error
#[macro_export]
macro_rules! config_bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::MonitorError::Config { message: $msg.to_string() })
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::MonitorError::Config { message: format!($fmt, $($arg)*) })
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_timeout_error() {
        let err = MonitorError::Timeout {
            duration: Duration::from_secs(10),
        };

        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("10s"));
        assert!(err.is_fetch_error());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_connection_refused_is_fetch_error() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 443);
        let err = MonitorError::ConnectionRefused { addr };

        assert!(err.to_string().contains("127.0.0.1:443"));
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_schedule_error_is_fatal() {
        let err = MonitorError::Schedule {
            expression: "every hour".to_string(),
            reason: "unknown format".to_string(),
        };

        assert!(err.is_fatal());
        assert!(!err.is_fetch_error());
        assert!(err.to_string().contains("every hour"));
    }

    #[test]
    fn test_config_bail_macro() {
        fn check(n: usize) -> crate::Result<()> {
            if n == 0 {
                config_bail!("no sites configured: {}", n);
            }
            Ok(())
        }

        let err = check(0).unwrap_err();
        assert!(matches!(err, MonitorError::Config { .. }));
        assert!(check(1).is_ok());
    }

    #[test]
    fn test_error_chain_preserved() {
        use std::error::Error;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "dns failed");
        let err = MonitorError::DnsResolutionFailed {
            hostname: "test.example".to_string(),
            source: io_err,
        };

        assert!(err.source().is_some());
    }
}

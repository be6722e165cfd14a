// Network utilities - address parsing, DNS resolution, socket helpers

use crate::{MonitorError, Result};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::*;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default HTTPS port
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Host and port extracted from a site address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse a site address (URL or host[:port])
    ///
    /// Accepted forms:
    /// ```text
    /// https://example.com
    /// https://example.com:8443/health
    /// example.com
    /// example.com:8443
    /// 192.0.2.10:443
    /// [2001:db8::1]:443
    /// ```
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(invalid_address(address, "address is empty"));
        }

        if address.contains("://") {
            let url = url::Url::parse(address)
                .map_err(|e| invalid_address(address, &e.to_string()))?;
            if url.scheme() != "https" {
                return Err(invalid_address(
                    address,
                    &format!("unsupported scheme {:?}, only https is monitored", url.scheme()),
                ));
            }
            let host = match url.host() {
                Some(url::Host::Ipv6(ip)) => ip.to_string(),
                Some(host) => host.to_string(),
                None => return Err(invalid_address(address, "no hostname in URL")),
            };
            let port = url.port().unwrap_or(DEFAULT_TLS_PORT);
            return Ok(Self {
                hostname: host,
                port,
            });
        }

        // Bracketed IPv6 literal, optionally followed by a port
        if let Some(rest) = address.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| invalid_address(address, "unterminated IPv6 literal"))?;
            let port = match tail.strip_prefix(':') {
                Some(port_str) => parse_port(address, port_str)?,
                None if tail.is_empty() => DEFAULT_TLS_PORT,
                None => return Err(invalid_address(address, "unexpected text after IPv6 literal")),
            };
            return Ok(Self {
                hostname: host.to_string(),
                port,
            });
        }

        // Bare IPv6 literal without port
        if address.parse::<IpAddr>().is_ok() {
            return Ok(Self {
                hostname: address.to_string(),
                port: DEFAULT_TLS_PORT,
            });
        }

        let (hostname, port) = match address.rsplit_once(':') {
            Some((host, port_str)) => (host, parse_port(address, port_str)?),
            None => (address, DEFAULT_TLS_PORT),
        };

        if hostname.is_empty() || hostname.contains('/') {
            return Err(invalid_address(address, "invalid hostname"));
        }

        Ok(Self {
            hostname: hostname.to_string(),
            port,
        })
    }

    /// Resolve to socket addresses
    pub async fn socket_addrs(&self) -> Result<Vec<SocketAddr>> {
        let ips = resolve_hostname(&self.hostname).await?;
        Ok(ips
            .into_iter()
            .map(|ip| SocketAddr::new(ip, self.port))
            .collect())
    }

    /// host:port identifier, brackets around IPv6 literals
    pub fn identifier(&self) -> String {
        if self.hostname.contains(':') {
            format!("[{}]:{}", self.hostname, self.port)
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.identifier())
    }
}

/// Resolve hostname to IP addresses
pub async fn resolve_hostname(hostname: &str) -> Result<Vec<IpAddr>> {
    // Check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let resolver = system_resolver();

    let response = resolver.lookup_ip(hostname).await.map_err(|e| {
        MonitorError::DnsResolutionFailed {
            hostname: hostname.to_string(),
            source: std::io::Error::other(e.to_string()),
        }
    })?;

    let ips: Vec<IpAddr> = response.iter().collect();

    if ips.is_empty() {
        return Err(MonitorError::DnsResolutionFailed {
            hostname: hostname.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        });
    }

    Ok(ips)
}

/// Resolver from the host's resolv.conf and hosts file, default config otherwise
fn system_resolver() -> TokioAsyncResolver {
    match TokioAsyncResolver::tokio_from_system_conf() {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::warn!("System resolver configuration unavailable ({}), using defaults", e);
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        }
    }
}

/// Connect to the first reachable address, each attempt bounded by `connect_timeout`
pub async fn connect_any(addrs: &[SocketAddr], connect_timeout: Duration) -> Result<TcpStream> {
    let mut last_error = None;

    for addr in addrs {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                last_error = Some(MonitorError::ConnectionRefused { addr: *addr });
            }
            Ok(Err(e)) => last_error = Some(e.into()),
            Err(_) => {
                last_error = Some(MonitorError::Timeout {
                    duration: connect_timeout,
                })
            }
        }
    }

    Err(last_error.unwrap_or_else(|| MonitorError::Other("No addresses to connect to".to_string())))
}

fn parse_port(address: &str, port_str: &str) -> Result<u16> {
    port_str
        .parse::<u16>()
        .map_err(|e| invalid_address(address, &format!("invalid port {:?}: {}", port_str, e)))
}

fn invalid_address(address: &str, reason: &str) -> MonitorError {
    MonitorError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    }
}

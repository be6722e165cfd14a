// Certificate Parser - Extract validity and identity from DER certificates

use crate::{MonitorError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::prelude::*;

/// Certificate information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub common_name: Option<String>,
    pub issuer: String,
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub san: Vec<String>, // Subject Alternative Names (DNS and IP entries)
    pub is_ca: bool,
}

impl CertificateInfo {
    /// Time left until `not_after`, negative once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.not_after - now
    }

    /// Whether `not_after` is not strictly after `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after <= now
    }

    /// Short label for logs and alerts: CN when present, full subject otherwise
    pub fn display_name(&self) -> &str {
        self.common_name.as_deref().unwrap_or(&self.subject)
    }
}

/// Certificate chain, in the order the server presented it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateChain {
    pub certificates: Vec<CertificateInfo>,
}

impl CertificateChain {
    pub fn new(certificates: Vec<CertificateInfo>) -> Self {
        Self { certificates }
    }

    /// Get the leaf (server) certificate
    pub fn leaf(&self) -> Option<&CertificateInfo> {
        self.certificates.first()
    }

    /// Get intermediate certificates
    pub fn intermediates(&self) -> &[CertificateInfo] {
        if self.certificates.len() > 1 {
            &self.certificates[1..]
        } else {
            &[]
        }
    }

    /// Earliest `not_after` across the chain
    pub fn earliest_expiry(&self) -> Option<DateTime<Utc>> {
        self.certificates.iter().map(|c| c.not_after).min()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertificateInfo> {
        self.certificates.iter()
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a CertificateInfo;
    type IntoIter = std::slice::Iter<'a, CertificateInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

/// Parse a single certificate from DER bytes
pub fn parse_certificate(der_bytes: &[u8]) -> Result<CertificateInfo> {
    let (_, cert) = X509Certificate::from_der(der_bytes).map_err(|e| {
        MonitorError::CertificateParse {
            details: format!("{:?}", e),
        }
    })?;

    let validity = cert.validity();
    let not_before = asn1_to_utc(&validity.not_before)?;
    let not_after = asn1_to_utc(&validity.not_after)?;

    // Extract Subject Alternative Names
    let mut san = Vec::new();
    if let Ok(Some(ext)) = cert.subject_alternative_name() {
        for name in &ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => san.push(dns.to_string()),
                GeneralName::IPAddress(ip) => san.push(format_ip_san(ip)),
                _ => {}
            }
        }
    }

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        common_name,
        issuer: cert.issuer().to_string(),
        serial_number: cert.raw_serial_as_string(),
        not_before,
        not_after,
        san,
        is_ca: cert.is_ca(),
    })
}

/// Parse every certificate of a presented chain, keeping order
pub fn parse_chain<'a, I>(ders: I) -> Result<CertificateChain>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let certificates = ders
        .into_iter()
        .map(parse_certificate)
        .collect::<Result<Vec<_>>>()?;

    Ok(CertificateChain::new(certificates))
}

fn asn1_to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0).ok_or_else(|| {
        MonitorError::CertificateParse {
            details: format!("validity timestamp out of range: {}", time),
        }
    })
}

fn format_ip_san(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
            format!("IP:{}", std::net::Ipv4Addr::from(octets))
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            format!("IP:{}", std::net::Ipv6Addr::from(octets))
        }
        _ => format!("IP:{}", bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()),
    }
}

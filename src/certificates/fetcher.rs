// Certificate Fetcher - Retrieve the peer certificate chain over TLS

use crate::certificates::parser::{CertificateChain, parse_chain};
use crate::utils::network::{Endpoint, connect_any};
use crate::{MonitorError, Result};
use async_trait::async_trait;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_rustls::TlsConnector;

/// How the server certificate is judged during the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Accept any presented chain so expired, self-signed or mismatched
    /// certificates can still be inspected. Handshake signatures are still checked.
    #[default]
    SkipValidation,
    /// Verify against the Mozilla root set; untrusted chains fail the fetch
    WebPki,
}

/// Anything that can hand back the certificate chain for an address
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Fetch the ordered peer certificate chain, failing with
    /// `MonitorError::Timeout` when `timeout` elapses first
    async fn fetch(&self, address: &str, timeout: Duration) -> Result<CertificateChain>;
}

/// rustls-backed fetcher
pub struct TlsCertificateFetcher {
    trust_policy: TrustPolicy,
    connector: TlsConnector,
}

impl TlsCertificateFetcher {
    /// Create a fetcher with the given trust policy
    pub fn new(trust_policy: TrustPolicy) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let mut config = match trust_policy {
            TrustPolicy::SkipValidation => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(SkipTrustVerifier { provider }))
                .with_no_client_auth(),
            TrustPolicy::WebPki => {
                let mut root_store = RootCertStore::empty();
                root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                builder
                    .with_root_certificates(root_store)
                    .with_no_client_auth()
            }
        };
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(Self {
            trust_policy,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }

    /// Fetcher used by the monitor: the chain is returned whatever its trust status
    pub fn skip_trust_validation() -> Result<Self> {
        Self::new(TrustPolicy::SkipValidation)
    }

    pub fn trust_policy(&self) -> TrustPolicy {
        self.trust_policy
    }

    async fn fetch_chain(&self, address: &str, timeout: Duration) -> Result<CertificateChain> {
        let endpoint = Endpoint::parse(address)?;
        let addrs = endpoint.socket_addrs().await?;
        let stream = connect_any(&addrs, timeout).await?;

        let server_name = ServerName::try_from(endpoint.hostname.clone()).map_err(|e| {
            MonitorError::InvalidAddress {
                address: address.to_string(),
                reason: format!("invalid server name: {}", e),
            }
        })?;

        let mut tls_stream = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| MonitorError::InvalidHandshake {
                details: format!("{} ({})", e, endpoint),
            })?;

        let (_io, connection) = tls_stream.get_ref();
        let peer_certificates = connection
            .peer_certificates()
            .ok_or_else(|| MonitorError::NoCertificates {
                address: address.to_string(),
            })?;

        let chain = parse_chain(peer_certificates.iter().map(|der| der.as_ref()))?;

        // Best effort close_notify; the chain is already in hand
        let _ = tls_stream.shutdown().await;

        Ok(chain)
    }
}

#[async_trait]
impl CertificateFetcher for TlsCertificateFetcher {
    async fn fetch(&self, address: &str, timeout: Duration) -> Result<CertificateChain> {
        tracing::debug!(
            "Fetching certificate chain from {} ({:?} policy)",
            address,
            self.trust_policy
        );

        match tokio::time::timeout(timeout, self.fetch_chain(address, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(MonitorError::Timeout { duration: timeout }),
        }
    }
}

/// Accepts any server certificate; still verifies handshake signatures
#[derive(Debug)]
struct SkipTrustVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for SkipTrustVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

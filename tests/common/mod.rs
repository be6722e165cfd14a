// Copyright (c) 2025 Marc Rivero López
// Licensed under GPLv3. See LICENSE file for details.

//! Local TLS endpoints serving rcgen-generated certificates with chosen
//! validity windows, so expiry handling can be exercised over a real handshake.

#![allow(dead_code)]

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::SocketAddr;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

/// Validity window relative to now
#[derive(Debug, Clone, Copy)]
pub struct Validity {
    pub not_before: Duration,
    pub not_after: Duration,
}

impl Validity {
    /// Expired `ago` in the past
    pub fn expired(ago: Duration) -> Self {
        Self {
            not_before: -(ago + Duration::days(90)),
            not_after: -ago,
        }
    }

    /// Valid now, expiring in `remaining`
    pub fn expiring_in(remaining: Duration) -> Self {
        Self {
            not_before: -Duration::days(30),
            not_after: remaining,
        }
    }
}

/// TLS listener on 127.0.0.1 that completes handshakes and drops the connection
pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// `https://127.0.0.1:<port>` address for site configuration
    pub fn address(&self) -> String {
        format!("https://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn params(name: &str, validity: Validity) -> CertificateParams {
    let now = OffsetDateTime::now_utc();
    let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
    params.distinguished_name.push(DnType::CommonName, name);
    params.not_before = now + validity.not_before;
    params.not_after = now + validity.not_after;
    params
}

/// Serve a single self-signed leaf certificate
pub async fn spawn_leaf_server(validity: Validity) -> TestServer {
    let key = KeyPair::generate().unwrap();
    let cert = params("localhost", validity).self_signed(&key).unwrap();

    serve(vec![cert.der().clone()], &key).await
}

/// Serve a leaf signed by a CA; the CA certificate is sent as the second chain entry
pub async fn spawn_chain_server(leaf: Validity, ca: Validity) -> TestServer {
    let ca_key = KeyPair::generate().unwrap();
    let mut ca_params = params("Test Intermediate", ca);
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca_cert = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = KeyPair::generate().unwrap();
    let leaf_cert = params("localhost", leaf)
        .signed_by(&leaf_key, &ca_cert, &ca_key)
        .unwrap();

    serve(vec![leaf_cert.der().clone(), ca_cert.der().clone()], &leaf_key).await
}

async fn serve(chain: Vec<CertificateDer<'static>>, key: &KeyPair) -> TestServer {
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(chain, key_der)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(socket).await {
                    let mut buf = [0u8; 256];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    TestServer { addr, handle }
}

/// Address on 127.0.0.1 with nothing listening
pub fn refused_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("https://{}", addr)
}

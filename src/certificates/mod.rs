// Certificates module - Chain retrieval and parsing

pub mod fetcher;
pub mod parser;

pub use fetcher::{CertificateFetcher, TlsCertificateFetcher, TrustPolicy};
pub use parser::{CertificateChain, CertificateInfo, parse_certificate, parse_chain};

//! rustls client configuration for the BMC's HTTPS endpoint.
//!
//! Two non-default modes:
//!   - custom trust: verify the server chain against a PEM CA bundle given
//!     with `--ca-file`
//!   - insecure: accept any server certificate (`--insecure`).  Handshake
//!     signatures are still checked, but neither chain nor hostname is.  This
//!     disables server authentication and must stay opt-in.
//!
//! With neither option the HTTP client keeps its built-in webpki roots and
//! this module is not used.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore, SignatureScheme};
use rustls_pemfile::certs;

use crate::error::{IdracError, Result};

// ── Accept-any verifier ───────────────────────────────────────────────────────

/// Skips certificate chain and hostname validation entirely.
///
/// BMCs commonly serve a self-signed certificate issued for a default
/// hostname, so this is what `--insecure` switches on.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity:    &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name:   &ServerName<'_>,
        _ocsp_response: &[u8],
        _now:           UnixTime,
    ) -> std::result::Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert:    &CertificateDer<'_>,
        dss:     &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
        // Older iDRAC firmware only speaks TLS 1.2.
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert:    &CertificateDer<'_>,
        dss:     &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

// ── Config factories ──────────────────────────────────────────────────────────

fn provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls_post_quantum::provider()))
}

/// Load every certificate in a PEM bundle into a root store.
pub fn load_root_store(ca_file: &Path) -> Result<RootCertStore> {
    let ca_pem = fs::read(ca_file)?;
    let mut root_store = RootCertStore::empty();
    for cert in certs(&mut Cursor::new(ca_pem)) {
        root_store.add(cert?)?;
    }
    if root_store.is_empty() {
        return Err(IdracError::Config(format!(
            "no certificates found in {}",
            ca_file.display()
        )));
    }
    Ok(root_store)
}

/// TLS config that trusts only the CAs in `ca_file`.
pub fn build_ca_config(ca_file: &Path) -> Result<ClientConfig> {
    let root_store = load_root_store(ca_file)?;
    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(config)
}

/// TLS config that accepts any server certificate.
pub fn build_insecure_config() -> Result<ClientConfig> {
    let provider = provider();
    let verifier = Arc::new(AcceptAnyServerCert { provider: Arc::clone(&provider) });
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(config)
}

//! Certificate loading and rustls server configuration.

use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::crypto::CryptoProvider;
use rustls::ServerConfig;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};

use super::options::TlsSettings;
use crate::error::ServeError;

/// ALPN protocols offered to clients, most preferred first
const ALPN_PROTOCOLS: [&[u8]; 2] = [b"h2", b"http/1.1"];

/// Load the certificate chain and private key and build the acceptor config.
///
/// Without explicit settings the aws-lc-rs defaults from
/// [`TlsSettings::default`] are used, so the process-wide rustls provider is
/// never consulted.
pub fn load_rustls_config(
    cert_path: &Path,
    key_path: &Path,
    settings: Option<&TlsSettings>,
) -> Result<RustlsConfig, ServeError> {
    let settings = settings.cloned().unwrap_or_default();

    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;
    let config = build_server_config(&settings, certs, key)?;

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServeError> {
    let certs = CertificateDer::pem_file_iter(path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|e| {
            ServeError::Tls(format!("Failed to read certificate '{}': {}", path.display(), e))
        })?;

    if certs.is_empty() {
        return Err(ServeError::Tls(format!(
            "No certificates found in '{}'",
            path.display()
        )));
    }

    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServeError> {
    PrivateKeyDer::from_pem_file(path).map_err(|e| {
        ServeError::Tls(format!("Failed to read private key '{}': {}", path.display(), e))
    })
}

/// Build a rustls server config restricted to the given versions, groups and suites.
pub fn build_server_config(
    settings: &TlsSettings,
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig, ServeError> {
    let provider = CryptoProvider {
        cipher_suites: settings.cipher_suites.clone(),
        kx_groups: settings.kx_groups.clone(),
        ..rustls::crypto::aws_lc_rs::default_provider()
    };

    let mut config = ServerConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(settings.min_version.protocol_versions())?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    config.alpn_protocols = ALPN_PROTOCOLS.iter().map(|p| p.to_vec()).collect();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::options::TlsVersion;
    use std::io::Write;

    /// Write a self-signed certificate for `localhost` into `dir`.
    fn self_signed(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let cert = dir.join("cert.pem");
        let key = dir.join("key.pem");
        std::fs::write(&cert, generated.cert.pem()).unwrap();
        std::fs::write(&key, generated.key_pair.serialize_pem()).unwrap();
        (cert, key)
    }

    #[test]
    fn missing_files_are_tls_errors() {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");

        let err = load_rustls_config(&cert, &key, None).unwrap_err();
        assert!(matches!(err, ServeError::Tls(ref msg) if msg.contains("cert.pem")));

        let settings = TlsSettings::cloudflare();
        let err = load_rustls_config(&cert, &key, Some(&settings)).unwrap_err();
        assert!(matches!(err, ServeError::Tls(ref msg) if msg.contains("cert.pem")));
    }

    #[test]
    fn default_settings_load_without_process_provider() {
        let dir = tempfile::tempdir().unwrap();
        let (cert, key) = self_signed(dir.path());

        // ring is also compiled in through the test client, which leaves the
        // process-wide rustls provider ambiguous
        load_rustls_config(&cert, &key, None).unwrap();
    }

    #[test]
    fn server_config_offers_alpn_and_restricts_versions() {
        let dir = tempfile::tempdir().unwrap();
        let (cert, key) = self_signed(dir.path());
        let certs = load_certs(&cert).unwrap();
        let key = load_private_key(&key).unwrap();

        let settings = TlsSettings {
            min_version: TlsVersion::Tls13,
            ..TlsSettings::cloudflare()
        };
        let config = build_server_config(&settings, certs, key).unwrap();

        assert_eq!(config.alpn_protocols, vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
        assert_eq!(
            config.crypto_provider().cipher_suites.len(),
            settings.cipher_suites.len()
        );
    }

    #[test]
    fn empty_certificate_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a certificate").unwrap();

        let err = load_certs(file.path()).unwrap_err();
        assert!(matches!(err, ServeError::Tls(ref msg) if msg.contains("No certificates")));
    }
}

//! TLS settings for the HTTP client.

use crate::config::TlsClientConfig;
use crate::error::ClientError;
use reqwest::{Certificate, ClientBuilder, Identity};
use std::path::Path;

/// Applies the TLS configuration to a client builder.
pub fn apply_tls(
    mut builder: ClientBuilder,
    config: &TlsClientConfig,
) -> Result<ClientBuilder, ClientError> {
    if let Some(ref ca_path) = config.ca_cert_path {
        let pem = read_pem(ca_path, "cert")?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| ClientError::Config(format!("invalid CA cert {:?}: {}", ca_path, e)))?;
        builder = builder.add_root_certificate(cert);
    }

    match (&config.client_cert_path, &config.client_key_path) {
        (Some(cert_path), Some(key_path)) => {
            // reqwest wants the certificate chain and key in one PEM buffer
            let mut pem = read_pem(cert_path, "cert")?;
            pem.push(b'\n');
            pem.extend(read_pem(key_path, "key")?);
            let identity = Identity::from_pem(&pem).map_err(|e| {
                ClientError::Config(format!("invalid client cert/key {:?}: {}", cert_path, e))
            })?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(ClientError::Config(
                "client certificate and key must be set together".to_string(),
            ))
        }
    }

    if config.insecure {
        tracing::warn!("Using insecure TLS (certificate verification disabled)");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

fn read_pem(path: &Path, kind: &str) -> Result<Vec<u8>, ClientError> {
    std::fs::read(path)
        .map_err(|e| ClientError::Config(format!("cannot open {} file {:?}: {}", kind, path, e)))
}

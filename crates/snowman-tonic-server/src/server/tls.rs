//! Server-side TLS setup.
//!
//! A certificate and key turn on TLS; adding a client CA makes the server
//! require and verify client certificates (mutual TLS). The ID service itself
//! is unaware of either.

use crate::server::config::ServerConfig;
use anyhow::Context;
use std::path::Path;
use tonic::transport::{Certificate, Identity, ServerTlsConfig};

/// Builds the TLS configuration for `config`, or `None` for plaintext.
pub fn server_tls_config(config: &ServerConfig) -> anyhow::Result<Option<ServerTlsConfig>> {
    let (Some(cert_path), Some(key_path)) = (&config.cert_file, &config.key_file) else {
        return Ok(None);
    };

    let cert = read_pem(cert_path)?;
    let key = read_pem(key_path)?;
    let mut tls = ServerTlsConfig::new().identity(Identity::from_pem(cert, key));

    if let Some(ca_path) = &config.client_ca {
        let ca = read_pem(ca_path)?;
        tls = tls.client_ca_root(Certificate::from_pem(ca));
    }

    Ok(Some(tls))
}

fn read_pem(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

//! A thin client for the `snowman.v1.SnowflakeService`.
//!
//! Wraps the generated tonic client, decodes wire messages into
//! [`SnowflakeId`]s, and optionally sets up TLS (mutual TLS when a client
//! certificate is supplied).
//!
//! ```no_run
//! use snowman_tonic_core::{ClientConfig, SnowmanClient};
//!
//! # async fn run() -> snowman_tonic_core::Result<()> {
//! let mut client = SnowmanClient::connect(ClientConfig::new("http://127.0.0.1:6996")).await?;
//! let id = client.next_id().await?;
//! println!("{id}");
//!
//! let mut cursor = client.batch_next_ids(10).await?;
//! while let Some(id) = cursor.next().await? {
//!     println!("{id}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::{
    Result,
    proto::{BatchIdsRequest, Empty, Snowflake, snowflake_service_client::SnowflakeServiceClient},
};
use snowman::SnowflakeId;
use std::path::PathBuf;
use tonic::{
    Streaming,
    transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity},
};

/// Connection settings for [`SnowmanClient`].
///
/// TLS is enabled when `ca_cert` is set. A `client_cert` and `client_key`
/// pair additionally presents a client identity, as required by servers
/// started with a client CA.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Server URI, e.g. `http://127.0.0.1:6996` or `https://ids.internal:6996`.
    pub endpoint: String,
    /// PEM file with the CA that signed the server certificate.
    pub ca_cert: Option<PathBuf>,
    /// PEM file with the client certificate.
    pub client_cert: Option<PathBuf>,
    /// PEM file with the client private key.
    pub client_key: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    fn tls_config(&self) -> Result<Option<ClientTlsConfig>> {
        let Some(ca_path) = &self.ca_cert else {
            return Ok(None);
        };

        let ca = std::fs::read(ca_path)?;
        let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(ca));

        if let (Some(cert_path), Some(key_path)) = (&self.client_cert, &self.client_key) {
            let cert = std::fs::read(cert_path)?;
            let key = std::fs::read(key_path)?;
            tls = tls.identity(Identity::from_pem(cert, key));
        }

        Ok(Some(tls))
    }
}

/// Client for a snowman ID server.
#[derive(Debug, Clone)]
pub struct SnowmanClient {
    inner: SnowflakeServiceClient<Channel>,
}

impl SnowmanClient {
    /// Connects to the server described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if a certificate or key cannot be read, the endpoint URI is
    /// invalid, or the connection cannot be established.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let mut endpoint = Endpoint::from_shared(config.endpoint.clone())?;
        if let Some(tls) = config.tls_config()? {
            endpoint = endpoint.tls_config(tls)?;
        }
        let channel = endpoint.connect().await?;
        Ok(Self::from_channel(channel))
    }

    /// Wraps an already established channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            inner: SnowflakeServiceClient::new(channel),
        }
    }

    /// Fetches a single identifier.
    ///
    /// # Errors
    ///
    /// Returns the server's status on failure, or [`crate::Error::InvalidId`]
    /// if the response is not an 8-byte id.
    pub async fn next_id(&mut self) -> Result<SnowflakeId> {
        let msg = self.inner.next_id(Empty {}).await?.into_inner();
        SnowflakeId::try_from(msg)
    }

    /// Opens a stream of `length` identifiers.
    ///
    /// The server rejects `length <= 0` with `INVALID_ARGUMENT`, surfaced
    /// here as [`crate::Error::Status`].
    ///
    /// # Errors
    ///
    /// Returns the server's status if the stream cannot be opened.
    pub async fn batch_next_ids(&mut self, length: i32) -> Result<SnowmanCursor> {
        let stream = self
            .inner
            .batch_next_id(BatchIdsRequest { length })
            .await?
            .into_inner();
        Ok(SnowmanCursor { stream })
    }
}

/// Iterates the identifiers of one `BatchNextId` stream.
pub struct SnowmanCursor {
    stream: Streaming<Snowflake>,
}

impl SnowmanCursor {
    /// Waits for the next identifier; `Ok(None)` once the batch is complete.
    ///
    /// # Errors
    ///
    /// Returns the status the stream was aborted with, or
    /// [`crate::Error::InvalidId`] for a malformed message.
    pub async fn next(&mut self) -> Result<Option<SnowflakeId>> {
        match self.stream.message().await? {
            Some(msg) => Ok(Some(SnowflakeId::try_from(msg)?)),
            None => Ok(None),
        }
    }

    /// Drains the remaining identifiers into a vector.
    ///
    /// # Errors
    ///
    /// Stops at the first error, discarding identifiers already received.
    pub async fn collect(mut self) -> Result<Vec<SnowflakeId>> {
        let mut ids = Vec::new();
        while let Some(id) = self.next().await? {
            ids.push(id);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn plaintext_without_ca() {
        let config = ClientConfig::new("http://127.0.0.1:6996");
        assert!(config.tls_config().unwrap().is_none());
    }

    #[test]
    fn missing_ca_file_is_io_error() {
        let config = ClientConfig {
            ca_cert: Some(PathBuf::from("/nonexistent/snowman-ca.pem")),
            ..ClientConfig::new("https://127.0.0.1:6996")
        };
        assert!(matches!(config.tls_config(), Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn invalid_uri_is_transport_error() {
        let res = SnowmanClient::connect(ClientConfig::new("not a uri")).await;
        assert!(matches!(res, Err(Error::Transport(_))));
    }
}

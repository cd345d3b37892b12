//! Example client for `snowman-server`.
//!
//! Fetches one ID with `NextId`, then streams `--count` more with
//! `BatchNextId`, printing each one as hex or as JSON.
//!
//! ```bash
//! snowman-client --addr http://127.0.0.1:6996 --count 5
//! snowman-client --addr https://ids.internal:6996 --ca-cert ca.pem \
//!     --client-cert client.pem --client-key client.key --format json
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use snowman_tonic_core::{ClientConfig, SnowmanClient, types::SnowflakeId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "snowman-client",
    version,
    about = "Fetch Snowflake IDs from a snowman server"
)]
struct Args {
    /// Server URI.
    ///
    /// Environment variable: `SNOWMAN_ADDR`
    #[arg(long, env = "SNOWMAN_ADDR", default_value_t = String::from("http://127.0.0.1:6996"))]
    addr: String,

    /// PEM CA that signed the server certificate. Enables TLS.
    #[arg(long, env = "TLS_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// PEM client certificate for mutual TLS.
    #[arg(long, env = "TLS_CLIENT_CERT", requires = "client_key")]
    client_cert: Option<PathBuf>,

    /// PEM client key for mutual TLS.
    #[arg(long, env = "TLS_CLIENT_KEY", requires = "client_cert")]
    client_key: Option<PathBuf>,

    /// Number of IDs to request in the batch.
    #[arg(short, long, default_value_t = 10)]
    count: i32,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Hex)]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    /// Lowercase hex, one per line.
    Hex,
    /// JSON string, one per line.
    Json,
}

impl Format {
    fn render(self, id: SnowflakeId) -> anyhow::Result<String> {
        match self {
            Self::Hex => Ok(id.to_string()),
            Self::Json => serde_json::to_string(&id).context("failed to encode id"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = ClientConfig {
        endpoint: args.addr.clone(),
        ca_cert: args.ca_cert,
        client_cert: args.client_cert,
        client_key: args.client_key,
    };
    let mut client = SnowmanClient::connect(config)
        .await
        .with_context(|| format!("failed to connect to {}", args.addr))?;

    let id = client.next_id().await.context("NextId failed")?;
    println!("{}", args.format.render(id)?);

    let mut cursor = client
        .batch_next_ids(args.count)
        .await
        .context("BatchNextId failed")?;
    while let Some(id) = cursor.next().await.context("batch stream aborted")? {
        println!("{}", args.format.render(id)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_hex_and_json() {
        let id = SnowflakeId::from_raw(0xfa00_2001);
        assert_eq!(Format::Hex.render(id).unwrap(), "fa002001");
        assert_eq!(Format::Json.render(id).unwrap(), "\"fa002001\"");
    }

    #[test]
    fn client_identity_needs_both_halves() {
        let res = Args::try_parse_from(["snowman-client", "--client-cert", "client.pem"]);
        assert!(res.is_err());
    }
}

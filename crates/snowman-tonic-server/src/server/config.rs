use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use snowman_tonic_core::types::SnowflakeId;
use std::path::PathBuf;

/// Runtime configuration for the `snowman-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for a single node.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowman-server",
    version,
    about = "A gRPC service issuing Snowflake IDs"
)]
pub struct CliArgs {
    /// Machine identifier embedded in every ID, in `0..=1023`.
    ///
    /// Must be unique among generators running concurrently in the fleet.
    /// When omitted, a random identifier is picked at startup.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID", allow_negative_numbers = true)]
    pub machine_id: Option<i64>,

    /// Capacity of the channel between the ID feeder and the gRPC stream.
    ///
    /// The feeder generates at most this many IDs ahead of what the client
    /// has consumed.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 1)]
    pub stream_buffer_size: usize,

    /// Seconds to let in-flight streams finish after a shutdown signal before
    /// they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:6996" or "/tmp/snowman.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:6996"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// PEM certificate presented by the server. Enables TLS.
    ///
    /// Environment variable: `TLS_CERT_FILE`
    #[arg(long, env = "TLS_CERT_FILE")]
    pub cert_file: Option<PathBuf>,

    /// PEM private key for `--cert-file`.
    ///
    /// Environment variable: `TLS_KEY_FILE`
    #[arg(long, env = "TLS_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// PEM CA bundle used to verify client certificates. Enables mutual TLS.
    ///
    /// Environment variable: `TLS_CLIENT_CA`
    #[arg(long, env = "TLS_CLIENT_CA")]
    pub client_ca: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub machine_id: i64,
    pub stream_buffer_size: usize,
    pub shutdown_timeout: Duration,
    pub server_addr: String,
    pub uds: bool,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub client_ca: Option<PathBuf>,
}

impl ServerConfig {
    /// Whether the server terminates TLS itself.
    pub const fn tls_enabled(&self) -> bool {
        self.cert_file.is_some()
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let max_machine_id = SnowflakeId::max_machine_id();

        let machine_id = match args.machine_id {
            Some(id) => {
                if !(0..=max_machine_id as i64).contains(&id) {
                    bail!("MACHINE_ID ({id}) must be between 0 and {max_machine_id}");
                }
                id
            }
            None => rand::random_range(0..=max_machine_id) as i64,
        };

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        match (&args.cert_file, &args.key_file) {
            (Some(_), None) => bail!("TLS_CERT_FILE is set but TLS_KEY_FILE is missing"),
            (None, Some(_)) => bail!("TLS_KEY_FILE is set but TLS_CERT_FILE is missing"),
            _ => {}
        }

        if args.client_ca.is_some() && args.cert_file.is_none() {
            bail!("TLS_CLIENT_CA requires TLS_CERT_FILE and TLS_KEY_FILE");
        }

        Ok(Self {
            machine_id,
            stream_buffer_size: args.stream_buffer_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            server_addr: args.server_addr,
            uds: args.uds,
            cert_file: args.cert_file,
            key_file: args.key_file,
            client_ca: args.client_ca,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = core::iter::once("snowman-server").chain(extra.iter().copied());
        ServerConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults() {
        let config = parse(&["--machine-id", "7"]).unwrap();
        assert_eq!(config.machine_id, 7);
        assert_eq!(config.stream_buffer_size, 1);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.server_addr, "0.0.0.0:6996");
        assert!(!config.uds);
        assert!(!config.tls_enabled());
    }

    #[test]
    fn machine_id_bounds() {
        assert!(parse(&["--machine-id", "0"]).is_ok());
        assert!(parse(&["--machine-id", "1023"]).is_ok());

        let err = parse(&["--machine-id", "1024"]).unwrap_err();
        assert!(err.to_string().contains("MACHINE_ID (1024)"));
        let err = parse(&["--machine-id", "-1"]).unwrap_err();
        assert!(err.to_string().contains("MACHINE_ID (-1)"));
    }

    #[test]
    fn random_machine_id_is_in_range() {
        for _ in 0..100 {
            let config = parse(&[]).unwrap();
            assert!((0..=1023).contains(&config.machine_id));
        }
    }

    #[test]
    fn zero_stream_buffer_is_rejected() {
        assert!(parse(&["--machine-id", "1", "--stream-buffer-size", "0"]).is_err());
    }

    #[test]
    fn tls_files_must_be_paired() {
        assert!(parse(&["--machine-id", "1", "--cert-file", "server.pem"]).is_err());
        assert!(parse(&["--machine-id", "1", "--key-file", "server.key"]).is_err());
        assert!(
            parse(&["--machine-id", "1", "--client-ca", "ca.pem"]).is_err(),
            "client CA without a server certificate"
        );

        let config = parse(&[
            "--machine-id",
            "1",
            "--cert-file",
            "server.pem",
            "--key-file",
            "server.key",
            "--client-ca",
            "ca.pem",
        ])
        .unwrap();
        assert!(config.tls_enabled());
    }
}

//! Configuration types and constants for the aperture server.

use std::path::PathBuf;

use clap::Parser;

pub(crate) const INVALIDATION_CHANNEL_CAPACITY: usize = 256;

/// Photo portfolio server.
///
/// Persists profiles, albums, and image metadata in SQLite, brokers
/// presigned uploads to S3, and resolves identities through an external
/// provider.
///
/// Configuration can be set via CLI arguments or environment variables.
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "aperture", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: APERTURE_BIND] [default: 127.0.0.1:3000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Data directory for the database [env: APERTURE_HOME] [default: ~/.aperture]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// S3 bucket for image binaries [env: APERTURE_S3_BUCKET]
    /// (absent: in-memory object store, local development only)
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// S3 region [env: APERTURE_S3_REGION] [default: us-east-1]
    #[arg(long)]
    pub s3_region: Option<String>,

    /// Identity provider verify endpoint [env: APERTURE_ORACLE_URL]
    /// (absent: insecure dev oracle, local development only)
    #[arg(long)]
    pub oracle_url: Option<String>,
}

pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub oracle_url: Option<String>,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var("APERTURE_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".aperture"))
                    .unwrap_or_else(|_| PathBuf::from(".aperture"))
            });

        let bind_addr = cli
            .bind
            .or_else(|| std::env::var("APERTURE_BIND").ok())
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());

        let s3_bucket = cli
            .s3_bucket
            .or_else(|| std::env::var("APERTURE_S3_BUCKET").ok());

        let s3_region = cli
            .s3_region
            .or_else(|| std::env::var("APERTURE_S3_REGION").ok())
            .unwrap_or_else(|| "us-east-1".to_string());

        let oracle_url = cli
            .oracle_url
            .or_else(|| std::env::var("APERTURE_ORACLE_URL").ok());

        Self {
            bind_addr,
            data_dir,
            s3_bucket,
            s3_region,
            oracle_url,
        }
    }
}

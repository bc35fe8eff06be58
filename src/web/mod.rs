//! aperture server: REST API over the portfolio persistence layer.
//!
//! Wires the long-lived resources together at startup (SQLite storage,
//! object store, identity oracle, invalidation channel) and serves the
//! API.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use aws_sdk_s3::config::Region;
use clap::Parser;
use tokio::sync::Mutex;

use crate::alog;
use crate::auth::{IdentityOracle, InsecureDevOracle, RemoteOracle};
use crate::invalidate::ViewInvalidator;
use crate::object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::storage::Storage;

use config::{Cli, Config, INVALIDATION_CHANNEL_CAPACITY};
use state::{AppState, SharedState};

/// Entry point: parse CLI, wire resources, start server.
pub async fn run() {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    crate::logging::init();

    alog!("aperture starting");
    alog!("  data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir).expect("failed to create data directory");
    let db_path = config.data_dir.join("aperture.db");
    let storage = Storage::open(&db_path).expect("failed to open database");
    alog!("  database: {}", db_path.display());

    let objects: Arc<dyn ObjectStore> = match &config.s3_bucket {
        Some(bucket) => {
            let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(config.s3_region.clone()))
                .load()
                .await;
            let client = aws_sdk_s3::Client::new(&shared);
            alog!("  object store: s3://{} ({})", bucket, config.s3_region);
            Arc::new(S3ObjectStore::new(client, bucket.clone(), config.s3_region.clone()))
        }
        None => {
            alog!("  object store: in-memory (no bucket configured; uploads are ephemeral)");
            Arc::new(MemoryObjectStore::new("aperture-dev", config.s3_region.clone()))
        }
    };

    let oracle: Arc<dyn IdentityOracle> = match &config.oracle_url {
        Some(url) => {
            alog!("  identity oracle: {}", url);
            Arc::new(RemoteOracle::new(url.clone()))
        }
        None => {
            alog!("  WARNING: no identity oracle configured; bearer tokens are trusted as-is");
            Arc::new(InsecureDevOracle)
        }
    };

    let invalidator = ViewInvalidator::new(INVALIDATION_CHANNEL_CAPACITY);

    // Log every invalidation signal.  Also keeps one receiver alive so the
    // channel is observably draining in local runs.
    let mut invalidation_rx = invalidator.subscribe();
    tokio::spawn(async move {
        while let Ok(path) = invalidation_rx.recv().await {
            alog!("invalidate: {}", path);
        }
    });

    let state: SharedState = Arc::new(AppState {
        storage: Mutex::new(storage),
        objects,
        oracle,
        invalidator,
    });

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    alog!("aperture listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}

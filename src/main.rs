use std::sync::Arc;

use colored::Colorize;
use config::{Config, ConfigError, Environment};
use keepsake_impls::{MemoryBlobStore, MemoryDatabase, PgDatabase, VercelBlobStore};
use keepsake_server::{run_server, ServerContext, StartError};
use keepsake_shop::{DatabaseError, SharedBlobStore, SharedDatabase, Shop};
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod config;
mod logging;

struct Keepsake {
    config: Config,
    context: ServerContext,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum KeepsakeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped: {0}")]
    Server(#[from] StartError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Keepsake {
    fn new() -> Result<Self, KeepsakeError> {
        let config = Config::from_env()?;
        info!("Starting in {} mode...", config.environment);

        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("keepsake-async")
            .build()
            .map_err(|e| KeepsakeError::Fatal(e.to_string()))?;

        let database = runtime.block_on(connect_database(&config))?;
        let blobs = blob_store(&config);

        Ok(Self {
            context: ServerContext::new(Shop::new(database, blobs)),
            config,
            runtime,
        })
    }

    fn run(self) -> Result<(), KeepsakeError> {
        let server_config = self.config.server();

        self.runtime
            .block_on(run_server(self.context, server_config))?;

        Ok(())
    }
}

async fn connect_database(config: &Config) -> Result<SharedDatabase, KeepsakeError> {
    match (config.environment, &config.database_url) {
        (Environment::Production, Some(url)) => {
            info!("Connecting to database...");
            Ok(Arc::new(PgDatabase::new(url).await?))
        }
        (Environment::Production, None) => Err(ConfigError::Missing("DATABASE_URL").into()),
        (Environment::Development, _) => {
            warn!("Using an in-memory database, nothing will be persisted.");
            Ok(Arc::new(MemoryDatabase::new()))
        }
    }
}

fn blob_store(config: &Config) -> SharedBlobStore {
    match &config.blob_token {
        Some(token) => Arc::new(VercelBlobStore::new(&config.blob_api_url, token)),
        None => {
            warn!("No blob token is set, uploaded files are kept in memory.");
            Arc::new(MemoryBlobStore::new())
        }
    }
}

impl KeepsakeError {
    fn hint(&self) -> String {
        match self {
            KeepsakeError::Config(_) => "Check the environment variables or the .env file. KEEPSAKE_ENV must be development or production, and production needs DATABASE_URL and BLOB_READ_WRITE_TOKEN.".to_string(),
            KeepsakeError::Database(_) => "This is a database error. Make sure PostgreSQL is running and DATABASE_URL points to it, then try again.".to_string(),
            KeepsakeError::Server(_) => "The server could not start. Make sure PORT is free and DEPLOYMENT_URL is a valid origin.".to_string(),
            KeepsakeError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn report(error: KeepsakeError) {
    error!(
        "{} Read the error below to troubleshoot the issue.",
        "Keepsake failed!".bold().red()
    );
    error!("{}", error);
    error!(
        "{}",
        format!("Hint: {}", error.hint()).bright_black().italic()
    );
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", e);
    }

    match Keepsake::new() {
        Ok(keepsake) => {
            info!("Initialized successfully.");

            if let Err(error) = keepsake.run() {
                report(error);
            }
        }
        Err(error) => report(error),
    }
}

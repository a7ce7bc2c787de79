mod auth;
mod context;
mod docs;
mod errors;
mod orders;
mod schemas;
mod serialized;
mod uploads;

#[cfg(test)]
mod tests;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use keepsake_shop::MAX_FILE_SIZE;
use log::info;
use std::{
    net::{Ipv6Addr, SocketAddr},
    time::Instant,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use context::*;
pub use errors::*;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 5000;

/// Room for multipart boundaries and headers on top of the file itself
const BODY_LIMIT: usize = MAX_FILE_SIZE + 64 * 1024;

pub type Router = axum::Router<ServerContext>;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// The only origin allowed by CORS, any origin is allowed if this is None
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origin: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("{0} is not a valid CORS origin")]
    InvalidOrigin(String),
    #[error("Could not bind to port {port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Builds the complete application, ready to be served
pub fn app(context: ServerContext, config: &ServerConfig) -> Result<axum::Router, StartError> {
    let api = Router::new()
        .merge(auth::router())
        .merge(orders::router())
        .merge(uploads::router())
        .route("/docs.json", get(docs::docs));

    let app = Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(log_requests))
        .layer(cors(config)?)
        .with_state(context);

    Ok(app)
}

/// Starts the keepsake server
pub async fn run_server(context: ServerContext, config: ServerConfig) -> Result<(), StartError> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();
    let app = app(context, &config)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartError::Bind {
            port: config.port,
            source,
        })?;

    info!("Listening on port {}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors(config: &ServerConfig) -> Result<CorsLayer, StartError> {
    let origin = match &config.allowed_origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|_| StartError::InvalidOrigin(origin.clone()))?;

            AllowOrigin::exact(value)
        }
        None => AllowOrigin::from(Any),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if path.starts_with("/api") {
        info!(
            "{} {} {} in {}ms",
            method,
            path,
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
    }

    response
}

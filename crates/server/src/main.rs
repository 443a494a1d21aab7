use crate::{
    auth::AccessClaims,
    config::{Config, ConfigError},
    doc::ApiDoc,
    routes::{api_router, public_router},
    state::AppState,
    utils::shutdown::shutdown_signal,
};
use axum::Router;
use database::db::create_connection;
use log::{error, info};
use migration::{Migrator, MigratorTrait};
use sea_orm::DbErr;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_oauth2_resource_server::server::OAuth2ResourceServer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod auth;
mod config;
mod doc;
mod dtos;
mod error;
mod extract;
mod routes;
mod state;
mod utils;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database: {0}")]
    Database(#[from] DbErr),

    #[error("identity provider: {0}")]
    IdentityProvider(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    let db = create_connection(&config.database_url, config.database_max_connections).await?;
    if config.run_migrations {
        info!("Applying pending migrations");
        Migrator::up(&db, None).await?;
    }

    let mut resource_server =
        OAuth2ResourceServer::<AccessClaims>::builder().issuer_url(config.oidc_issuer_url.as_str());
    if !config.oidc_audiences.is_empty() {
        resource_server = resource_server.audiences(config.oidc_audiences.as_slice());
    }
    let resource_server = resource_server
        .build()
        .await
        .map_err(|e| StartupError::IdentityProvider(format!("{e:?}")))?;

    let app = Router::new()
        .merge(public_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router().layer(ServiceBuilder::new().layer(resource_server.into_layer())))
        .layer(CompressionLayer::new())
        .with_state(AppState { db });

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!("Running axum on {}", config.display_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use tracing::info;

use service::auth::{
    password::CredentialVerifier, repo::seaorm::SeaOrmAuthRepository, AuthSettings, TokenService,
};
use service::catalog::seaorm::SeaOrmProductRepository;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Wire services over the SeaORM repositories, seed the configured roles and,
/// per `[seed]`, the demo users and catalog.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Any(anyhow::anyhow!("migration failed: {e}")))?;

    let products = Arc::new(SeaOrmProductRepository { db: db.clone() });
    let repo = Arc::new(SeaOrmAuthRepository { db });
    let verifier = Arc::new(CredentialVerifier::from_config(&cfg.auth.argon2)?);
    let tokens = Arc::new(TokenService::new(cfg.auth.jwt_secret.as_deref()));
    if !tokens.is_configured() {
        return Err(StartupError::InvalidConfig("JWT_SECRET is not set".into()));
    }

    let state = ServerState::new(repo.clone(), repo, products, verifier, tokens, AuthSettings::from_config(&cfg.auth));
    let seeded = state.auth.seed_roles().await?;
    info!(count = seeded.len(), "roles seeded");
    if cfg.seed.demo_users {
        let users = state.auth.seed_users(&cfg.seed.demo_password).await?;
        info!(count = users.len(), "demo users seeded");
    }
    if cfg.seed.demo_products {
        state
            .products
            .seed_catalog(cfg.seed.demo_product_count)
            .await
            .map_err(|e| StartupError::Any(anyhow::anyhow!("catalog seed failed: {e}")))?;
    }
    Ok(routes::build_router(state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
    info!("shutdown signal received");
}

/// Public entry: load config, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, ttl = cfg.auth.jwt_expires_in, role_claim = ?cfg.auth.role_claim, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

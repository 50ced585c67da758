//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod storage;

use crate::{
    config::{AppState, Config},
    services::expiry_reaper::spawn_expiry_reaper,
    storage::LocalBlobStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let db_pool = config.connect_pool().await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let blobs = LocalBlobStore::new(&config.images_dir);
    blobs.ensure_dir().await?;
    tracing::info!(dir = %blobs.root().display(), "diretório de imagens pronto");

    let app_state = AppState::from_pool(&config, db_pool, blobs);

    if let Some(seed) = &config.superuser {
        app_state
            .auth_service
            .ensure_superuser(&seed.name, &seed.email, &seed.password)
            .await?;
    }

    spawn_expiry_reaper(app_state.product_service.store(), config.reaper_interval);

    let app = routes::router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context("Falha ao iniciar o listener TCP")?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app)
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}

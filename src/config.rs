// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        PriceChangeLogRepository, PriceChangeLogStore, ProductRepository, ProductStore,
        UserRepository, UserStore,
    },
    services::{
        auth::AuthService, image_lifecycle::ImageLifecycle, price_governance::PriceGovernance,
        product_service::ProductService,
    },
    storage::{BlobStore, LocalBlobStore},
};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_JWT_TTL_HOURS: i64 = 7 * 24;

/// Credenciais do superusuário criado na inicialização.
#[derive(Debug, Clone)]
pub struct SuperuserSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub images_dir: PathBuf,
    pub max_image_bytes: usize,
    pub reaper_interval: Duration,
    pub jwt_ttl: chrono::Duration,
    pub superuser: Option<SuperuserSeed>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} deve ser definida"))
        };

        let superuser = match (
            lookup("SUPERUSER_EMAIL"),
            lookup("SUPERUSER_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(SuperuserSeed {
                name: lookup("SUPERUSER_NAME").unwrap_or_else(|| "Super User".into()),
                email,
                password,
            }),
            _ => None,
        };

        // `tokio::time::interval` não aceita período zero
        let reaper_secs: u64 = parse_or(&lookup, "REAPER_INTERVAL_SECS", DEFAULT_REAPER_INTERVAL_SECS)?;
        if reaper_secs == 0 {
            anyhow::bail!("REAPER_INTERVAL_SECS deve ser maior que zero");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            images_dir: lookup("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("images")),
            max_image_bytes: parse_or(&lookup, "MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            reaper_interval: Duration::from_secs(reaper_secs),
            jwt_ttl: chrono::Duration::hours(parse_or(
                &lookup,
                "JWT_TTL_HOURS",
                DEFAULT_JWT_TTL_HOURS,
            )?),
            superuser,
        })
    }

    pub async fn connect_pool(&self) -> anyhow::Result<PgPool> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(db_pool)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} inválida: {raw}")),
        None => Ok(default),
    }
}

/// Implementações concretas dos stores usadas para montar o estado.
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub price_logs: Arc<dyn PriceChangeLogStore>,
    pub blobs: Arc<dyn BlobStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub product_service: ProductService,
    pub images_dir: PathBuf,
    pub max_image_bytes: usize,
}

impl AppState {
    // --- Monta o gráfico de dependências ---
    pub fn new(config: &Config, stores: Stores) -> Self {
        let auth_service = AuthService::new(stores.users, config.jwt_secret.clone(), config.jwt_ttl);
        let product_service = ProductService::new(
            stores.products,
            PriceGovernance::new(stores.price_logs),
            ImageLifecycle::new(stores.blobs),
        );

        Self {
            auth_service,
            product_service,
            images_dir: config.images_dir.clone(),
            max_image_bytes: config.max_image_bytes,
        }
    }

    pub fn from_pool(config: &Config, db_pool: PgPool, blobs: LocalBlobStore) -> Self {
        Self::new(
            config,
            Stores {
                users: Arc::new(UserRepository::new(db_pool.clone())),
                products: Arc::new(ProductRepository::new(db_pool.clone())),
                price_logs: Arc::new(PriceChangeLogRepository::new(db_pool)),
                blobs: Arc::new(blobs),
            },
        )
    }
}

//! # stockpilot-db
//!
//! Persistence layer for Stockpilot:
//! - **PostgreSQL**: plans, subscriptions, credit packs, generations, site content
//! - **S3 / MinIO**: uploaded generation files

pub mod postgres;
pub mod repository;
pub mod storage;

use anyhow::Result;
use sqlx::PgPool;

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
}

impl Database {
    /// Connect to PostgreSQL.
    pub async fn connect(config: &stockpilot_common::config::AppConfig) -> Result<Self> {
        tracing::info!("Connecting to PostgreSQL...");
        let pg = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        Ok(Self { pg })
    }

    /// Pool that connects on first use. Lets routers be built without a live server.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pg = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect_lazy(url)?;
        Ok(Self { pg })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pg).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }
}

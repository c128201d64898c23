use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::{openapi, routes};
use crate::config::FoodgramConfig;
use crate::contract::client::FoodgramApi;
use crate::domain::service::Service;
use crate::gateways::local::FoodgramLocalClient;
use crate::infra::storage::sea_orm_repo::SeaOrmFoodgramRepository;

/// The recipe platform module: domain service wired to SeaORM storage,
/// exposed over REST and as an in-process client.
#[derive(Clone)]
pub struct Foodgram {
    service: Arc<Service>,
}

impl Foodgram {
    /// Wire repository (infra) to domain service (port).
    pub fn init(db: DatabaseConnection, cfg: FoodgramConfig) -> Self {
        info!("Initializing foodgram module");
        debug!(
            "Loaded foodgram config: default_page_size={}, max_page_size={}",
            cfg.default_page_size, cfg.max_page_size
        );
        let repo = SeaOrmFoodgramRepository::new(db);
        let service = Service::new(Arc::new(repo), cfg.into());
        Self {
            service: Arc::new(service),
        }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running foodgram database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None)
            .await
            .context("foodgram migrations failed")?;
        info!("Foodgram database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Local in-process client implementation.
    pub fn client(&self) -> Arc<dyn FoodgramApi> {
        Arc::new(FoodgramLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering foodgram REST routes");
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        openapi::openapi()
    }
}

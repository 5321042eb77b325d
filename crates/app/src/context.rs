//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::AppConfig,
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        identity::{IdentityService, PgIdentityService},
        orders::{OrdersService, PgOrdersService},
        payments::{MockGateway, PaymentsService, PgPaymentsService},
        products::{PgProductsService, ProductsService},
        settlements::{PgSettlementsService, SettlementsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub identity: Arc<dyn IdentityService>,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentsService>,
    pub settlements: Arc<dyn SettlementsService>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// Payments go through [`MockGateway`] until a real provider is
    /// wired in.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&config.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        Ok(Self {
            identity: Arc::new(PgIdentityService::new(db.clone())),
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone(), config.lead_time())),
            payments: Arc::new(PgPaymentsService::new(
                db.clone(),
                Arc::new(MockGateway::new()),
            )),
            settlements: Arc::new(PgSettlementsService::new(db)),
        })
    }
}

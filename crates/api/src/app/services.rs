use std::sync::Arc;

use anyhow::Context;

use rocketcart_core::CartId;
use rocketcart_infra::{
    BroadcastNotifier, CartHandle, DurableStore, HttpStockOracle, Notifier, SqliteStore,
    StockOracle,
};

use crate::config::Config;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppServices {
    pub cart: CartHandle,
    /// Notifications also fan out to live SSE listeners.
    pub notifications: BroadcastNotifier,
}

impl AppServices {
    /// Wire the cart against explicit collaborators.
    pub async fn new(
        cart_id: CartId,
        store: Arc<dyn DurableStore>,
        oracle: Arc<dyn StockOracle>,
    ) -> Self {
        let notifications = BroadcastNotifier::new(256);
        let notifier: Arc<dyn Notifier> = Arc::new(notifications.clone());
        let cart = CartHandle::load(cart_id, store, oracle, notifier).await;

        Self {
            cart,
            notifications,
        }
    }

    /// Production wiring: SQLite store + HTTP stock service.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::open(&config.db_path)
            .await
            .with_context(|| format!("failed to open cart store at {:?}", config.db_path))?;

        let oracle = HttpStockOracle::new(config.stock_url.clone(), config.stock_timeout)
            .context("failed to build stock client")?;

        tracing::info!(
            cart_id = %config.cart_id,
            stock_url = %config.stock_url,
            db_path = %config.db_path.display(),
            "cart services ready"
        );

        Ok(Self::new(config.cart_id.clone(), Arc::new(store), Arc::new(oracle)).await)
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use rocketcart_core::ProductId;

use super::r#trait::{StockError, StockOracle};

/// Fixed stock table.
///
/// Intended for tests/dev. Products without an entry fail like an unknown
/// product would on the real stock service.
#[derive(Debug, Default)]
pub struct StaticStockOracle {
    stock: RwLock<HashMap<ProductId, u32>>,
}

impl StaticStockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stock(entries: impl IntoIterator<Item = (ProductId, u32)>) -> Self {
        Self {
            stock: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Set (or replace) the reported maximum for a product.
    pub fn set(&self, product_id: ProductId, amount: u32) {
        if let Ok(mut stock) = self.stock.write() {
            stock.insert(product_id, amount);
        }
    }

    /// Forget a product, making further lookups fail.
    pub fn remove(&self, product_id: ProductId) {
        if let Ok(mut stock) = self.stock.write() {
            stock.remove(&product_id);
        }
    }
}

#[async_trait::async_trait]
impl StockOracle for StaticStockOracle {
    async fn max_amount(&self, product_id: ProductId) -> Result<u32, StockError> {
        let stock = self
            .stock
            .read()
            .map_err(|_| StockError::Network("lock poisoned".to_string()))?;

        stock
            .get(&product_id)
            .copied()
            .ok_or(StockError::UnknownProduct(product_id))
    }
}

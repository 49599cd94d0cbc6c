use std::sync::Arc;

use rocketcart_core::ProductId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("no stock information for product {0}")]
    UnknownProduct(ProductId),
    #[error("network error: {0}")]
    Network(String),
    #[error("stock API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Source of truth for purchasable quantities.
///
/// Implementations decide their own timeout policy; the cart manager waits
/// for as long as the oracle takes.
#[async_trait::async_trait]
pub trait StockOracle: Send + Sync {
    /// Maximum quantity of `product_id` that may be held in a cart right now.
    async fn max_amount(&self, product_id: ProductId) -> Result<u32, StockError>;
}

#[async_trait::async_trait]
impl<O> StockOracle for Arc<O>
where
    O: StockOracle + ?Sized,
{
    async fn max_amount(&self, product_id: ProductId) -> Result<u32, StockError> {
        (**self).max_amount(product_id).await
    }
}

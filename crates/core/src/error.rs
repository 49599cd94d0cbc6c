//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (invariants,
/// stock limits). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The product is not part of the cart.
    #[error("product {0} not found in cart")]
    NotFound(ProductId),

    /// The requested quantity is not positive.
    #[error("amount {amount} for product {product_id} must be positive")]
    InvalidAmount { product_id: ProductId, amount: i64 },

    /// The requested quantity exceeds the stock observed for the product.
    #[error("requested {requested} of product {product_id}, only {available} available")]
    StockExhausted {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },
}

impl DomainError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(product_id: ProductId) -> Self {
        Self::NotFound(product_id)
    }

    pub fn stock_exhausted(product_id: ProductId, requested: i64, available: u32) -> Self {
        Self::StockExhausted {
            product_id,
            requested,
            available,
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rocketcart_core::{Entity, ProductId};

/// Catalog product as seen by the cart.
///
/// Sourced from the catalog and never changed by the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in major currency units (e.g. `179.90`).
    pub price: Decimal,
    pub image: String,
}

/// Cart line: a product plus the quantity being bought.
///
/// Field layout is the persisted layout; renaming a field breaks stored carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    /// Unit price in major currency units (e.g. `179.90`).
    pub price: Decimal,
    pub image: String,
    pub amount: u32,
}

impl LineItem {
    pub fn new(product: Product, amount: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
        }
    }
}

impl Entity for LineItem {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

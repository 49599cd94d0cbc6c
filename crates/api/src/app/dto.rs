use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rocketcart_cart::{Cart, LineItem, Product};
use rocketcart_core::{AggregateRoot, ProductId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    pub product_id: i64,
    pub title: String,
    /// JSON number or decimal string (`179.9` or `"179.90"`).
    pub price: Decimal,
    pub image: String,
}

impl AddProductRequest {
    pub fn into_product(self) -> Product {
        Product {
            id: ProductId::new(self.product_id),
            title: self.title,
            price: self.price,
            image: self.image,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAmountRequest {
    pub amount: i64,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart_id: String,
    pub version: u64,
    pub total_amount: u64,
    pub items: Vec<LineItem>,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            cart_id: cart.id().to_string(),
            version: cart.version(),
            total_amount: cart.total_amount(),
            items: cart.into_items(),
        }
    }
}

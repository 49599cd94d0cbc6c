use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path,
        rejection::{JsonRejection, PathRejection},
    },
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use rocketcart_core::ProductId;
use rocketcart_infra::{AmountChange, CartOperation};

use crate::app::dto::{AddProductRequest, CartResponse, UpdateAmountRequest};
use crate::app::errors;
use crate::app::routes::stream;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_cart))
        .route("/stream", get(stream::stream_cart))
        .route("/items", post(add_product))
        .route("/items/:id", delete(remove_product))
        .route("/items/:id/amount", put(update_product_amount))
}

/// GET /cart
pub async fn get_cart(Extension(services): Extension<Arc<AppServices>>) -> Json<CartResponse> {
    Json(CartResponse::from(services.cart.cart()))
}

/// POST /cart/items
///
/// Adds the product, or increments it by one when already present.
pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    req: Result<Json<AddProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(req) = match req {
        Ok(req) => req,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.cart.add_product(req.into_product()).await {
        Ok(cart) => Json(CartResponse::from(cart)).into_response(),
        Err(e) => errors::cart_error_to_response(CartOperation::Add, e),
    }
}

/// DELETE /cart/items/:id
pub async fn remove_product(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<i64>, PathRejection>,
) -> axum::response::Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match services.cart.remove_product(ProductId::new(id)).await {
        Ok(cart) => Json(CartResponse::from(cart)).into_response(),
        Err(e) => errors::cart_error_to_response(CartOperation::Remove, e),
    }
}

/// PUT /cart/items/:id/amount
pub async fn update_product_amount(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<i64>, PathRejection>,
    req: Result<Json<UpdateAmountRequest>, JsonRejection>,
) -> axum::response::Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(req) = match req {
        Ok(req) => req,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let change = AmountChange {
        product_id: ProductId::new(id),
        amount: req.amount,
    };

    match services.cart.update_product_amount(change).await {
        Ok(cart) => Json(CartResponse::from(cart)).into_response(),
        Err(e) => errors::cart_error_to_response(CartOperation::UpdateAmount, e),
    }
}

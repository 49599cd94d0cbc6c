use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use rocketcart_infra::{CartError, CartOperation, notification_for};

/// Map a failed cart operation to a JSON error whose `message` is the
/// notification the shopper was shown.
pub fn cart_error_to_response(operation: CartOperation, err: CartError) -> axum::response::Response {
    let message = notification_for(operation, &err).message();
    let (status, code) = match &err {
        CartError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CartError::StockExhausted { .. } => (StatusCode::CONFLICT, "stock_exhausted"),
        CartError::InvalidAmount { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_amount"),
        CartError::OracleUnavailable(_) => (StatusCode::BAD_GATEWAY, "stock_unavailable"),
        CartError::Persistence(_) | CartError::Snapshot(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error")
        }
        CartError::Domain(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation"),
    };

    json_error(status, code, message, err.to_string())
}

/// Malformed or mistyped request body.
pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(
        rejection.status(),
        "invalid_request",
        "request body is not valid",
        rejection.body_text(),
    )
}

/// Path segment that does not parse (e.g. a non-numeric product id).
pub fn path_rejection(rejection: PathRejection) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "invalid_request",
        "product id must be an integer",
        rejection.body_text(),
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    detail: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "detail": detail.into(),
        })),
    )
        .into_response()
}

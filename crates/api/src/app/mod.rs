//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: cart handle + collaborators wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/cart", routes::cart::router())
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(services))))
}

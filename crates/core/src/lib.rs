//! `rocketcart-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::DomainError;
pub use id::{CartId, ProductId};

//! Shopping cart domain module.
//!
//! This crate contains the business rules for the cart, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Stock availability
//! is an input: callers look it up and pass the observation in the command.

pub mod cart;
pub mod product;

pub use cart::{
    AddProduct, AmountUpdated, Cart, CartCommand, CartEvent, ProductAdded, ProductIncremented,
    ProductRemoved, RemoveProduct, UpdateProductAmount,
};
pub use product::{LineItem, Product};

//! HTTP API: a thin consumer of the cart handle.

pub mod app;
pub mod config;

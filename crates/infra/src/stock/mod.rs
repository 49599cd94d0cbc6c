//! Stock oracle boundary: how many units of a product may currently be bought.

pub mod http;
pub mod in_memory;
pub mod r#trait;

pub use http::HttpStockOracle;
pub use in_memory::StaticStockOracle;
pub use r#trait::{StockError, StockOracle};

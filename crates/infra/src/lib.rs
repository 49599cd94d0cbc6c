//! Infrastructure layer: durable store, stock oracle, notifications, and the
//! cart manager that composes them.

pub mod cart_manager;
pub mod notify;
pub mod snapshot;
pub mod stock;
pub mod store;

pub use cart_manager::{
    AmountChange, CartChange, CartChanged, CartError, CartHandle, CartManager, CartOperation,
    notification_for,
};
pub use notify::{BroadcastNotifier, Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use stock::{HttpStockOracle, StaticStockOracle, StockError, StockOracle};
pub use store::{DurableStore, InMemoryStore, SqliteStore, StoreError};

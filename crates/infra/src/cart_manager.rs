//! Cart state manager: the one owner of the current cart.
//!
//! Every mutation runs the same pipeline:
//!
//! ```text
//! Operation
//!   ↓
//! 1. Acquire the cart's write lock (mutations are serialized)
//!   ↓
//! 2. Ask the stock oracle for the product's maximum (add / update only)
//!   ↓
//! 3. Decide + apply on a copy of the current cart (pure domain logic)
//!   ↓
//! 4. Write the new snapshot to the durable store
//!   ↓
//! 5. Swap the copy in as current state and publish the change
//! ```
//!
//! A failure at any step leaves the current cart untouched and produces
//! exactly one notification. Readers never wait on steps 1-4: the committed
//! cart lives behind its own lock, written only in step 5.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rocketcart_cart::{
    AddProduct, Cart, CartCommand, CartEvent, LineItem, Product, RemoveProduct,
    UpdateProductAmount,
};
use rocketcart_core::{AggregateRoot, CartId, DomainError, ProductId};
use rocketcart_events::{Event, EventBus, EventEnvelope, InMemoryEventBus, Subscription};

use crate::notify::{Notification, Notifier};
use crate::snapshot::{self, SnapshotError};
use crate::stock::{StockError, StockOracle};
use crate::store::{DurableStore, StoreError};

/// The three cart mutations, used to pick the failure notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    fn failure(self) -> Notification {
        match self {
            CartOperation::Add => Notification::AddFailed,
            CartOperation::Remove => Notification::RemovalFailed,
            CartOperation::UpdateAmount => Notification::AmountChangeFailed,
        }
    }
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("stock lookup failed: {0}")]
    OracleUnavailable(#[source] StockError),

    #[error("requested {requested} of product {product_id}, only {available} available")]
    StockExhausted {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    #[error("amount {amount} for product {product_id} must be positive")]
    InvalidAmount { product_id: ProductId, amount: i64 },

    #[error("product {0} not found in cart")]
    NotFound(ProductId),

    #[error("failed to persist cart: {0}")]
    Persistence(#[from] StoreError),

    #[error("failed to encode cart: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Domain(DomainError),
}

impl From<DomainError> for CartError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(product_id) => CartError::NotFound(product_id),
            DomainError::InvalidAmount { product_id, amount } => {
                CartError::InvalidAmount { product_id, amount }
            }
            DomainError::StockExhausted {
                product_id,
                requested,
                available,
            } => CartError::StockExhausted {
                product_id,
                requested,
                available,
            },
            other => CartError::Domain(other),
        }
    }
}

/// Map a failed operation to the single message shown for it.
///
/// Quantity problems get the dedicated "unavailable" message; everything
/// else gets the operation's generic failure message.
pub fn notification_for(operation: CartOperation, err: &CartError) -> Notification {
    match err {
        CartError::StockExhausted { .. } | CartError::InvalidAmount { .. } => {
            Notification::QuantityUnavailable
        }
        _ => operation.failure(),
    }
}

/// Request to set an explicit amount for a product already in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountChange {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Payload published for every committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartChange {
    pub event: CartEvent,
    /// Cart contents right after the change.
    pub items: Vec<LineItem>,
}

pub type CartChanged = EventEnvelope<CartChange>;

/// Owns the current cart and runs every mutation against its collaborators.
///
/// Collaborators default to type-erased handles so that one concrete manager
/// type can be shared by consumers regardless of the backing implementations.
pub struct CartManager<
    S = Arc<dyn DurableStore>,
    O = Arc<dyn StockOracle>,
    N = Arc<dyn Notifier>,
> {
    cart_id: CartId,
    store: S,
    oracle: O,
    notifier: N,
    bus: InMemoryEventBus<CartChanged>,
    state: RwLock<Cart>,
    write_lock: tokio::sync::Mutex<()>,
}

impl<S, O, N> CartManager<S, O, N>
where
    S: DurableStore,
    O: StockOracle,
    N: Notifier,
{
    /// Build a manager, hydrating the cart stored under `cart_id`.
    pub async fn load(cart_id: CartId, store: S, oracle: O, notifier: N) -> Self {
        let cart = snapshot::hydrate(&store, &cart_id).await;

        Self {
            cart_id,
            store,
            oracle,
            notifier,
            bus: InMemoryEventBus::new(),
            state: RwLock::new(cart),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn cart_id(&self) -> &CartId {
        &self.cart_id
    }

    /// Current committed cart.
    pub fn cart(&self) -> Cart {
        match self.state.read() {
            Ok(cart) => cart.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Receive every change committed after this call.
    pub fn subscribe(&self) -> Subscription<CartChanged> {
        self.bus.subscribe()
    }

    /// Add one unit of `product`, appending a new line if it is not in the cart yet.
    pub async fn add_product(&self, product: Product) -> Result<Cart, CartError> {
        let product_id = product.id;
        let result = self.try_add(product).await;
        self.finish(CartOperation::Add, product_id, result)
    }

    /// Drop the line for `product_id`.
    pub async fn remove_product(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let result = self.try_remove(product_id).await;
        self.finish(CartOperation::Remove, product_id, result)
    }

    /// Set the line for `change.product_id` to exactly `change.amount`.
    pub async fn update_product_amount(&self, change: AmountChange) -> Result<Cart, CartError> {
        let result = self.try_update_amount(change).await;
        self.finish(CartOperation::UpdateAmount, change.product_id, result)
    }

    async fn try_add(&self, product: Product) -> Result<Cart, CartError> {
        let _guard = self.write_lock.lock().await;

        let stock = self
            .oracle
            .max_amount(product.id)
            .await
            .map_err(CartError::OracleUnavailable)?;

        self.commit(CartCommand::AddProduct(AddProduct {
            product,
            stock,
            occurred_at: Utc::now(),
        }))
        .await
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let _guard = self.write_lock.lock().await;

        self.commit(CartCommand::RemoveProduct(RemoveProduct {
            product_id,
            occurred_at: Utc::now(),
        }))
        .await
    }

    async fn try_update_amount(&self, change: AmountChange) -> Result<Cart, CartError> {
        let _guard = self.write_lock.lock().await;

        // No stock lookup for a line that does not exist.
        if !self.cart().contains(change.product_id) {
            return Err(CartError::NotFound(change.product_id));
        }

        let stock = self
            .oracle
            .max_amount(change.product_id)
            .await
            .map_err(CartError::OracleUnavailable)?;

        self.commit(CartCommand::UpdateProductAmount(UpdateProductAmount {
            product_id: change.product_id,
            amount: change.amount,
            stock,
            occurred_at: Utc::now(),
        }))
        .await
    }

    /// Decide, persist, then swap in. Caller must hold `write_lock`.
    async fn commit(&self, command: CartCommand) -> Result<Cart, CartError> {
        let current = self.cart();
        let (next, events) = current.evolve(&command)?;

        let blob = snapshot::encode(&next, Utc::now())?;
        self.store.write(self.cart_id.as_str(), &blob).await?;

        match self.state.write() {
            Ok(mut state) => *state = next.clone(),
            Err(poisoned) => *poisoned.into_inner() = next.clone(),
        }

        self.publish(current.version(), events, &next);

        Ok(next)
    }

    fn publish(&self, base_version: u64, events: Vec<CartEvent>, cart: &Cart) {
        for (idx, event) in events.into_iter().enumerate() {
            let version = base_version + idx as u64 + 1;
            tracing::info!(
                cart_id = %self.cart_id,
                event_type = event.event_type(),
                product_id = %event.product_id(),
                version,
                "cart changed"
            );

            let change = CartChange {
                event,
                items: cart.items().to_vec(),
            };
            if let Err(err) = self
                .bus
                .publish(EventEnvelope::new(self.cart_id.clone(), version, change))
            {
                tracing::warn!(cart_id = %self.cart_id, "cart change publish failed: {err:?}");
            }
        }
    }

    fn finish(
        &self,
        operation: CartOperation,
        product_id: ProductId,
        result: Result<Cart, CartError>,
    ) -> Result<Cart, CartError> {
        if let Err(err) = &result {
            let notification = notification_for(operation, err);
            match err {
                CartError::Persistence(_) | CartError::Snapshot(_) => tracing::error!(
                    cart_id = %self.cart_id,
                    product_id = %product_id,
                    ?operation,
                    "cart operation failed: {err}"
                ),
                _ => tracing::warn!(
                    cart_id = %self.cart_id,
                    product_id = %product_id,
                    ?operation,
                    "cart operation rejected: {err}"
                ),
            }
            self.notifier.notify_error(notification.message());
        }

        result
    }
}

/// Access point for consumers: a cheap, cloneable handle onto one manager.
///
/// Holds no state of its own; every call forwards to the shared manager.
pub struct CartHandle<S = Arc<dyn DurableStore>, O = Arc<dyn StockOracle>, N = Arc<dyn Notifier>>
{
    inner: Arc<CartManager<S, O, N>>,
}

impl<S, O, N> Clone for CartHandle<S, O, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, O, N> CartHandle<S, O, N>
where
    S: DurableStore,
    O: StockOracle,
    N: Notifier,
{
    pub fn new(manager: CartManager<S, O, N>) -> Self {
        Self {
            inner: Arc::new(manager),
        }
    }

    /// Hydrate a manager and wrap it in a handle.
    pub async fn load(cart_id: CartId, store: S, oracle: O, notifier: N) -> Self {
        Self::new(CartManager::load(cart_id, store, oracle, notifier).await)
    }

    pub fn cart_id(&self) -> &CartId {
        self.inner.cart_id()
    }

    pub fn cart(&self) -> Cart {
        self.inner.cart()
    }

    pub fn subscribe(&self) -> Subscription<CartChanged> {
        self.inner.subscribe()
    }

    pub async fn add_product(&self, product: Product) -> Result<Cart, CartError> {
        self.inner.add_product(product).await
    }

    pub async fn remove_product(&self, product_id: ProductId) -> Result<Cart, CartError> {
        self.inner.remove_product(product_id).await
    }

    pub async fn update_product_amount(&self, change: AmountChange) -> Result<Cart, CartError> {
        self.inner.update_product_amount(change).await
    }
}

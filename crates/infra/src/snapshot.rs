//! Cart snapshot encoding and startup hydration.
//!
//! A snapshot is a JSON document holding the ordered line items plus stream
//! metadata. The bare form written by older clients (just the JSON array of
//! line items) is still accepted on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rocketcart_cart::{Cart, LineItem};
use rocketcart_core::{AggregateRoot, CartId, DomainError};

use crate::store::DurableStore;

pub const SCHEMA_VERSION: u32 = 1;

/// Persisted form of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub schema_version: u32,
    pub cart_id: CartId,
    pub version: u64,
    pub saved_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Snapshot(CartSnapshot),
    Legacy(Vec<LineItem>),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode cart snapshot: {0}")]
    Encode(serde_json::Error),
    #[error("failed to decode cart snapshot: {0}")]
    Decode(serde_json::Error),
    #[error("unsupported snapshot schema version {0}")]
    UnsupportedSchema(u32),
    #[error("snapshot violates cart invariants: {0}")]
    Invalid(DomainError),
}

impl CartSnapshot {
    pub fn of(cart: &Cart, saved_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            cart_id: cart.id().clone(),
            version: cart.version(),
            saved_at,
            items: cart.items().to_vec(),
        }
    }
}

/// Serialize a cart for the durable store.
pub fn encode(cart: &Cart, saved_at: DateTime<Utc>) -> Result<String, SnapshotError> {
    serde_json::to_string(&CartSnapshot::of(cart, saved_at)).map_err(SnapshotError::Encode)
}

/// Deserialize a stored blob into the cart identified by `cart_id`.
///
/// The key the blob was stored under wins over any id recorded inside it.
pub fn decode(cart_id: &CartId, blob: &str) -> Result<Cart, SnapshotError> {
    let stored: StoredCart = serde_json::from_str(blob).map_err(SnapshotError::Decode)?;

    let (items, version) = match stored {
        StoredCart::Snapshot(snapshot) => {
            if snapshot.schema_version != SCHEMA_VERSION {
                return Err(SnapshotError::UnsupportedSchema(snapshot.schema_version));
            }
            (snapshot.items, snapshot.version)
        }
        StoredCart::Legacy(items) => (items, 0),
    };

    Cart::restore(cart_id.clone(), items, version).map_err(SnapshotError::Invalid)
}

/// Load the cart stored under `cart_id`, falling back to an empty cart.
///
/// Startup never fails because of cart state: a missing key, an unreadable
/// store, or a corrupt snapshot all yield an empty cart.
pub async fn hydrate<S>(store: &S, cart_id: &CartId) -> Cart
where
    S: DurableStore + ?Sized,
{
    let blob = match store.read(cart_id.as_str()).await {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            tracing::info!(cart_id = %cart_id, "no stored cart; starting empty");
            return Cart::empty(cart_id.clone());
        }
        Err(err) => {
            tracing::error!(cart_id = %cart_id, "failed to read stored cart: {err}");
            return Cart::empty(cart_id.clone());
        }
    };

    match decode(cart_id, &blob) {
        Ok(cart) => {
            tracing::info!(
                cart_id = %cart_id,
                items = cart.len(),
                version = cart.version(),
                "restored cart"
            );
            cart
        }
        Err(err) => {
            tracing::warn!(cart_id = %cart_id, "discarding stored cart: {err}");
            Cart::empty(cart_id.clone())
        }
    }
}

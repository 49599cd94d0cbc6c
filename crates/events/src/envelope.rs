use serde::{Deserialize, Serialize};

use rocketcart_core::CartId;

/// Envelope for a committed cart change, carrying stream metadata.
///
/// `version` is the cart version *after* the change was applied, so
/// subscribers can detect gaps or discard stale deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    cart_id: CartId,
    version: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(cart_id: CartId, version: u64, payload: E) -> Self {
        Self {
            cart_id,
            version,
            payload,
        }
    }

    pub fn cart_id(&self) -> &CartId {
        &self.cart_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}

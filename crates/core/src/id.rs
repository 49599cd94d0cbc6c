//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a catalog product (assigned by the catalog, never by the cart).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<ProductId> for i64 {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("ProductId: {e}")))?;
        Ok(Self(id))
    }
}

/// Identifier of a cart. Doubles as the durable store key for its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(String);

impl CartId {
    /// Key used when no explicit cart identifier is configured.
    pub const DEFAULT_KEY: &'static str = "@RocketShoes:cart";

    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::invalid_id("CartId: key cannot be empty"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CartId {
    fn default() -> Self {
        Self(Self::DEFAULT_KEY.to_string())
    }
}

impl core::fmt::Display for CartId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CartId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use rocketcart_core::CartId;

pub const BIND_VAR: &str = "ROCKETCART_BIND";
pub const STOCK_URL_VAR: &str = "ROCKETCART_STOCK_URL";
pub const STOCK_TIMEOUT_VAR: &str = "ROCKETCART_STOCK_TIMEOUT_MS";
pub const DB_PATH_VAR: &str = "ROCKETCART_DB_PATH";
pub const CART_KEY_VAR: &str = "ROCKETCART_CART_KEY";

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_STOCK_URL: &str = "http://localhost:3333";
const DEFAULT_STOCK_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub stock_url: String,
    /// Upper bound on a single stock lookup.
    pub stock_timeout: Duration,
    pub db_path: PathBuf,
    pub cart_id: CartId,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables take
    /// their defaults; set but malformed ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var(BIND_VAR)
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .with_context(|| format!("{BIND_VAR} must be a socket address"))?;

        let stock_url = var(STOCK_URL_VAR).unwrap_or_else(|| {
            tracing::warn!("{STOCK_URL_VAR} not set; using {DEFAULT_STOCK_URL}");
            DEFAULT_STOCK_URL.to_string()
        });
        if !stock_url.starts_with("http://") && !stock_url.starts_with("https://") {
            bail!("{STOCK_URL_VAR} must be an http(s) URL, got {stock_url:?}");
        }

        let stock_timeout_ms = match var(STOCK_TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{STOCK_TIMEOUT_VAR} must be milliseconds"))?,
            None => DEFAULT_STOCK_TIMEOUT_MS,
        };

        let db_path = match var(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => {
                let path = default_db_path()?;
                tracing::warn!("{DB_PATH_VAR} not set; using {}", path.display());
                path
            }
        };

        let cart_id = match var(CART_KEY_VAR) {
            Some(key) => CartId::new(key).with_context(|| format!("invalid {CART_KEY_VAR}"))?,
            None => CartId::default(),
        };

        Ok(Self {
            bind_addr,
            stock_url,
            stock_timeout: Duration::from_millis(stock_timeout_ms),
            db_path,
            cart_id,
        })
    }
}

/// `{app_data_dir}/rocketcart/cart.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    dir.push("rocketcart");
    dir.push("cart.db");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn explicit_values_are_used() {
        let config = Config::from_lookup(lookup(&[
            (BIND_VAR, "127.0.0.1:9000"),
            (STOCK_URL_VAR, "http://stock.internal"),
            (STOCK_TIMEOUT_VAR, "250"),
            (DB_PATH_VAR, "/tmp/cart.db"),
            (CART_KEY_VAR, "@Shop:cart"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.stock_url, "http://stock.internal");
        assert_eq!(config.stock_timeout, Duration::from_millis(250));
        assert_eq!(config.db_path, PathBuf::from("/tmp/cart.db"));
        assert_eq!(config.cart_id.as_str(), "@Shop:cart");
    }

    #[test]
    fn defaults_fill_unset_and_blank_values() {
        let config = Config::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/cart.db"),
            (CART_KEY_VAR, "  "),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.stock_url, DEFAULT_STOCK_URL);
        assert_eq!(config.stock_timeout, Duration::from_millis(DEFAULT_STOCK_TIMEOUT_MS));
        assert_eq!(config.cart_id, CartId::default());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[(DB_PATH_VAR, "/x"), (BIND_VAR, "nope")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[(DB_PATH_VAR, "/x"), (STOCK_TIMEOUT_VAR, "soon")])).is_err()
        );
        assert!(
            Config::from_lookup(lookup(&[(DB_PATH_VAR, "/x"), (STOCK_URL_VAR, "ftp://stock")])).is_err()
        );
    }
}

//! Stock oracle backed by the catalog's HTTP stock endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use rocketcart_core::ProductId;
use serde::Deserialize;

use super::r#trait::{StockError, StockOracle};

/// Body of `GET {base_url}/stock/{id}`. Only `amount` is consumed.
#[derive(Debug, Deserialize)]
struct StockResponse {
    amount: u32,
}

/// HTTP client for the stock endpoint.
///
/// Every request is bounded by the configured timeout; a timed-out request
/// is reported as a network error like any other transport failure.
#[derive(Debug, Clone)]
pub struct HttpStockOracle {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStockOracle {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StockError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockError::Network(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl StockOracle for HttpStockOracle {
    async fn max_amount(&self, product_id: ProductId) -> Result<u32, StockError> {
        let url = format!("{}/stock/{}", self.base_url, product_id);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StockError::Network(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StockError::UnknownProduct(product_id));
        }

        if !resp.status().is_success() {
            return Err(StockError::Api(
                resp.status().as_u16(),
                resp.text().await.unwrap_or_default(),
            ));
        }

        let body: StockResponse = resp
            .json()
            .await
            .map_err(|e| StockError::Parse(e.to_string()))?;

        tracing::debug!(product_id = %product_id, amount = body.amount, "stock lookup");

        Ok(body.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Path, http::StatusCode as AxumStatus, response::IntoResponse, routing::get};

    async fn stock(Path(id): Path<i64>) -> axum::response::Response {
        match id {
            1 => Json(serde_json::json!({"id": 1, "amount": 5})).into_response(),
            2 => (AxumStatus::OK, "not json").into_response(),
            3 => (AxumStatus::SERVICE_UNAVAILABLE, "down").into_response(),
            _ => AxumStatus::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_stock_server() -> (String, tokio::task::JoinHandle<()>) {
        let app = Router::new().route("/stock/:id", get(stock));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/", addr), handle)
    }

    #[tokio::test]
    async fn reads_amount_and_maps_failures() {
        let (base_url, handle) = spawn_stock_server().await;
        let oracle = HttpStockOracle::new(base_url, Duration::from_secs(5)).unwrap();
        assert!(!oracle.base_url().ends_with('/'));

        assert_eq!(oracle.max_amount(ProductId::new(1)).await.unwrap(), 5);
        assert!(matches!(
            oracle.max_amount(ProductId::new(2)).await,
            Err(StockError::Parse(_))
        ));
        assert!(matches!(
            oracle.max_amount(ProductId::new(3)).await,
            Err(StockError::Api(503, body)) if body == "down"
        ));
        assert!(matches!(
            oracle.max_amount(ProductId::new(4)).await,
            Err(StockError::UnknownProduct(id)) if id == ProductId::new(4)
        ));

        handle.abort();
    }

    #[tokio::test]
    async fn unreachable_service_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let oracle = HttpStockOracle::new(format!("http://{addr}"), Duration::from_secs(1)).unwrap();

        assert!(matches!(
            oracle.max_amount(ProductId::new(1)).await,
            Err(StockError::Network(_))
        ));
    }
}

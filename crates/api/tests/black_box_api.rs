use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::Path, extract::State, http::StatusCode as AxumStatus, response::IntoResponse, routing::get};
use reqwest::StatusCode;
use serde_json::json;

use rocketcart_api::app::{self, services::AppServices};
use rocketcart_core::CartId;
use rocketcart_infra::{DurableStore, HttpStockOracle, InMemoryStore};

type StockTable = Arc<Mutex<HashMap<i64, u32>>>;

/// Stand-in for the catalog's stock endpoint.
struct FakeStock {
    base_url: String,
    table: StockTable,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeStock {
    async fn spawn(stock: &[(i64, u32)]) -> Self {
        let table: StockTable = Arc::new(Mutex::new(stock.iter().copied().collect()));

        async fn lookup(State(table): State<StockTable>, Path(id): Path<i64>) -> axum::response::Response {
            let amount = table.lock().unwrap().get(&id).copied();
            match amount {
                Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
                None => AxumStatus::NOT_FOUND.into_response(),
            }
        }

        let app = Router::new()
            .route("/stock/:id", get(lookup))
            .with_state(table.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            table,
            handle,
        }
    }

    fn set(&self, id: i64, amount: u32) {
        self.table.lock().unwrap().insert(id, amount);
    }
}

impl Drop for FakeStock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(stock_url: &str, store: Arc<InMemoryStore>) -> Self {
        let oracle = HttpStockOracle::new(stock_url, Duration::from_secs(2)).unwrap();
        let store: Arc<dyn DurableStore> = store;
        let services = AppServices::new(CartId::default(), store, Arc::new(oracle)).await;

        // Same router as prod, bound to an ephemeral port.
        let app = app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn product(id: i64) -> serde_json::Value {
    json!({
        "product_id": id,
        "title": format!("Sneaker {id}"),
        "price": 179.9,
        "image": format!("https://cdn.example/{id}.jpg"),
    })
}

fn amounts(body: &serde_json::Value) -> Vec<(i64, u64)> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| (item["id"].as_i64().unwrap(), item["amount"].as_u64().unwrap()))
        .collect()
}

#[tokio::test]
async fn health_is_ok() {
    let stock = FakeStock::spawn(&[]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;

    let res = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn add_then_increment_until_stock_runs_out() {
    let stock = FakeStock::spawn(&[(1, 2)]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;
    let client = reqwest::Client::new();
    let url = format!("{}/cart/items", server.base_url);

    for expected in [1, 2] {
        let res = client.post(&url).json(&product(1)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(amounts(&body), vec![(1, expected)]);
        assert_eq!(body["items"][0]["price"], "179.9");
    }

    let res = client.post(&url).json(&product(1)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "stock_exhausted");
    assert_eq!(body["message"], "requested quantity unavailable");

    let cart: serde_json::Value = client
        .get(format!("{}/cart", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(amounts(&cart), vec![(1, 2)]);
    assert_eq!(cart["total_amount"], 2);
    assert_eq!(cart["version"], 2);
}

#[tokio::test]
async fn update_amount_is_bounded_by_stock() {
    let stock = FakeStock::spawn(&[(1, 10), (2, 5)]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;
    let client = reqwest::Client::new();

    for id in [1, 2] {
        let res = client
            .post(format!("{}/cart/items", server.base_url))
            .json(&product(id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .put(format!("{}/cart/items/2/amount", server.base_url))
        .json(&json!({ "amount": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(amounts(&body), vec![(1, 1), (2, 5)]);

    let res = client
        .put(format!("{}/cart/items/2/amount", server.base_url))
        .json(&json!({ "amount": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .put(format!("{}/cart/items/1/amount", server.base_url))
        .json(&json!({ "amount": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_amount");
    assert_eq!(body["message"], "requested quantity unavailable");

    let res = client
        .put(format!("{}/cart/items/9/amount", server.base_url))
        .json(&json!({ "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "amount change failed");
}

#[tokio::test]
async fn remove_drops_line_and_unknown_ids_are_not_found() {
    let stock = FakeStock::spawn(&[(1, 3), (2, 3)]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;
    let client = reqwest::Client::new();

    for id in [1, 2] {
        client
            .post(format!("{}/cart/items", server.base_url))
            .json(&product(id))
            .send()
            .await
            .unwrap();
    }

    let res = client
        .delete(format!("{}/cart/items/1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(amounts(&body), vec![(2, 1)]);

    let res = client
        .delete(format!("{}/cart/items/1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "removal failed");
}

#[tokio::test]
async fn stock_service_failures_leave_cart_untouched() {
    let stock = FakeStock::spawn(&[]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/cart/items", server.base_url))
        .json(&product(7))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "add failed");

    stock.set(7, 0);
    let res = client
        .post(format!("{}/cart/items", server.base_url))
        .json(&product(7))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let cart: serde_json::Value = client
        .get(format!("{}/cart", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["version"], 0);
}

#[tokio::test]
async fn cart_survives_restart_on_same_store() {
    let stock = FakeStock::spawn(&[(4, 3)]).await;
    let store = Arc::new(InMemoryStore::new());
    let client = reqwest::Client::new();

    {
        let server = TestServer::spawn(&stock.base_url, store.clone()).await;
        for _ in 0..2 {
            let res = client
                .post(format!("{}/cart/items", server.base_url))
                .json(&product(4))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
    }

    let server = TestServer::spawn(&stock.base_url, store).await;
    let cart: serde_json::Value = client
        .get(format!("{}/cart", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(amounts(&cart), vec![(4, 2)]);
    assert_eq!(cart["cart_id"], CartId::DEFAULT_KEY);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let stock = FakeStock::spawn(&[(1, 3)]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/cart/items", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");
    assert!(body["detail"].is_string());

    let res = client
        .post(format!("{}/cart/items", server.base_url))
        .json(&json!({ "product_id": 1, "title": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let res = client
        .delete(format!("{}/cart/items/abc", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");

    let res = client
        .put(format!("{}/cart/items/abc/amount", server.base_url))
        .json(&json!({ "amount": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "product id must be an integer");
}

#[tokio::test]
async fn stream_is_server_sent_events() {
    let stock = FakeStock::spawn(&[]).await;
    let server = TestServer::spawn(&stock.base_url, Arc::new(InMemoryStore::new())).await;

    let res = reqwest::get(format!("{}/cart/stream", server.base_url)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"), "{content_type}");
}

//! Live cart feed over Server-Sent Events.
//!
//! Two event kinds are sent:
//! - `cart.changed`: every committed change, with the cart contents after it
//! - `cart.notification`: every failure message shown to the shopper

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::app::services::AppServices;

/// GET /cart/stream
pub async fn stream_cart(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let (tx, rx) = unbounded_channel::<Result<SseEvent, Infallible>>();

    // Committed changes come off the std mpsc bus, so forward them from a
    // blocking thread.
    let subscription = services.cart.subscribe();
    let changes_tx = tx.clone();
    tokio::task::spawn_blocking(move || {
        loop {
            match subscription.recv_timeout(Duration::from_millis(1000)) {
                Ok(envelope) => {
                    let data = serde_json::json!({
                        "cart_id": envelope.cart_id().to_string(),
                        "version": envelope.version(),
                        "event": envelope.payload().event,
                        "items": envelope.payload().items,
                    });

                    let sse_event = SseEvent::default()
                        .event("cart.changed")
                        .data(data.to_string());

                    if changes_tx.send(Ok(sse_event)).is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                    if changes_tx.is_closed() {
                        break;
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    let mut notifications = services.notifications.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = notifications.recv() => match received {
                    Ok(message) => {
                        let data = serde_json::json!({ "message": message });
                        let sse_event = SseEvent::default()
                            .event("cart.notification")
                            .data(data.to_string());
                        if tx.send(Ok(sse_event)).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "sse listener lagged behind notifications");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tx.closed() => break,
            }
        }
    });

    Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

//! Change publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes committed cart changes to any number of independent
//! consumers. It is for distribution only: the durable store stays the source
//! of truth, and a consumer that misses a message can always re-read the
//! current cart snapshot.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a change stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Messages arrive in publication order.
///
/// ```ignore
/// let subscription = handle.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(change) => render(change),
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic pub/sub abstraction.
///
/// `publish()` can fail (e.g. poisoned lock). Publication happens after the
/// change is durable, so a failed publish never rolls anything back.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}

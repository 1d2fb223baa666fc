//! Stream of results produced by a background task.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sending half handed to the task that produces an [`Observation`].
#[derive(Debug)]
pub struct Emitter<T> {
    items: mpsc::UnboundedSender<T>,
}

impl<T> Emitter<T> {
    /// Delivers `item`. Returns false once the observer is gone.
    pub fn emit(&self, item: T) -> bool {
        self.items.send(item).is_ok()
    }

    /// Returns true once the observer is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.items.is_closed()
    }
}

/// A live subscription.
///
/// The producing task is aborted when the observation is dropped, which
/// cancels any remote call it has in flight.
#[derive(Debug)]
pub struct Observation<T> {
    items: mpsc::UnboundedReceiver<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Observation<T> {
    /// Spawns `produce` and streams what it emits.
    pub fn spawn<F, Fut>(produce: F) -> Self
    where
        F: FnOnce(Emitter<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(produce(Emitter { items: tx }));
        Self { items: rx, task }
    }
}

impl<T> Stream for Observation<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().items.poll_recv(cx)
    }
}

impl<T> Unpin for Observation<T> {}

impl<T> Drop for Observation<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

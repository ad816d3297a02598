use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::DispatchError;

/// Handle to a queued send's eventual outcome.
///
/// Resolves with the operation's result once the queue reaches a terminal
/// state for the task. Dropping the ticket does NOT cancel the task; the
/// operation still runs to completion and its outcome is discarded.
pub struct SendTicket<T> {
    id: Uuid,
    rx: oneshot::Receiver<Result<T, DispatchError>>,
}

impl<T> SendTicket<T> {
    pub(crate) fn new(id: Uuid, rx: oneshot::Receiver<Result<T, DispatchError>>) -> Self {
        Self { id, rx }
    }

    /// Queue-assigned task id, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<T> Future for SendTicket<T> {
    type Output = Result<T, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Sender dropped without a result: the queue itself went away.
            Poll::Ready(Err(_)) => Poll::Ready(Err(DispatchError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

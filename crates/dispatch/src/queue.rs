//! The dispatch queue and its drain loop.
//!
//! Submissions are admitted immediately and executed one at a time by a
//! single-flight drain loop: at most one loop runs per queue instance, and a
//! submission arriving while the loop is live extends it instead of spawning
//! a second one. A failed task is reinserted at the *front* of the queue once
//! its cooldown elapses, so it runs before anything submitted after it but
//! after whatever was already ahead of it.
//!
//! All shared state (the deque, the draining flag, the last-start timestamp)
//! sits behind one mutex that is never held across an await; executions
//! themselves happen outside the lock, and the loop's pop-then-execute shape
//! keeps each task out of the queue while it runs.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::ticket::SendTicket;

/// Boxed future returned by one invocation of a send operation.
type OpFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

/// Re-invokable send operation. Each retry calls the factory again, so the
/// underlying effect must be safe to repeat.
type SendOp<T> = Box<dyn FnMut() -> OpFuture<T> + Send>;

/// A queued unit of work.
struct QueuedSend<T> {
    /// Opaque id generated at submission time, used only for log correlation.
    id: Uuid,
    op: SendOp<T>,
    done: oneshot::Sender<Result<T, DispatchError>>,
    retry_count: u32,
    retry_limit: u32,
}

struct QueueState<T> {
    queue: VecDeque<QueuedSend<T>>,
    /// True while a drain loop is live (single-flight guard).
    draining: bool,
    /// Start time of the most recent execution, for pacing.
    last_started_at: Option<Instant>,
}

struct Shared<T> {
    state: Mutex<QueueState<T>>,
    min_interval: Duration,
    retry_delay: Duration,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().expect("dispatch queue lock poisoned")
    }
}

/// Process-local, in-memory queue that serializes asynchronous sends.
///
/// Cloning is cheap and shares the same queue; construct one per external
/// rate-limit domain and hand it to every caller that sends through it.
/// Submissions must happen inside a tokio runtime (the drain loop runs as a
/// spawned task).
pub struct DispatchQueue<T> {
    shared: Arc<Shared<T>>,
    default_retry_limit: u32,
}

impl<T> Clone for DispatchQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            default_retry_limit: self.default_retry_limit,
        }
    }
}

impl<T: Send + 'static> DispatchQueue<T> {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    draining: false,
                    last_started_at: None,
                }),
                min_interval: config.min_interval(),
                retry_delay: config.retry_delay,
            }),
            default_retry_limit: config.max_retries,
        }
    }

    /// Enqueue an operation with the queue's default retry limit.
    ///
    /// The task is admitted synchronously; the returned ticket resolves with
    /// the operation's eventual result, or with the terminal error after
    /// retries are exhausted. There is no cancellation: once submitted, the
    /// task runs to a terminal state even if the ticket is dropped.
    pub fn submit<F, Fut>(&self, op: F) -> SendTicket<T>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.submit_with_retry_limit(op, self.default_retry_limit)
    }

    /// Enqueue an operation with a per-task retry ceiling.
    ///
    /// A limit of zero makes the first failure terminal.
    pub fn submit_with_retry_limit<F, Fut>(&self, mut op: F, retry_limit: u32) -> SendTicket<T>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (done, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let task = QueuedSend {
            id,
            op: Box::new(move || -> OpFuture<T> { Box::pin(op()) }),
            done,
            retry_count: 0,
            retry_limit,
        };

        let mut state = self.shared.lock();
        state.queue.push_back(task);
        Self::spawn_drain_if_idle(&self.shared, &mut state);
        drop(state);

        SendTicket::new(id, rx)
    }

    /// Number of tasks waiting in the queue (excludes the one executing).
    pub fn len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().queue.is_empty()
    }

    /// Whether a drain loop is currently live.
    pub fn is_draining(&self) -> bool {
        self.shared.lock().draining
    }

    /// Start a drain loop unless one is already live. Must be called with the
    /// state lock held so the flag check-and-set is atomic.
    fn spawn_drain_if_idle(shared: &Arc<Shared<T>>, state: &mut QueueState<T>) {
        if !state.draining {
            state.draining = true;
            tokio::spawn(Self::drain(Arc::clone(shared)));
        }
    }

    /// The drain loop: pop, pace, execute, repeat until the queue is empty.
    async fn drain(shared: Arc<Shared<T>>) {
        loop {
            // Wait out the pacing gap before touching the head of the queue,
            // so a retry reinserted during the wait is picked up first.
            let wait = {
                let mut state = shared.lock();
                if state.queue.is_empty() {
                    // Cleared under the same lock submissions take: a racing
                    // submit either sees the flag down and spawns a fresh
                    // loop, or pushed before we got here.
                    state.draining = false;
                    return;
                }
                match state.last_started_at {
                    Some(last) => shared.min_interval.saturating_sub(last.elapsed()),
                    None => Duration::ZERO,
                }
            };
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            let mut task = {
                let mut state = shared.lock();
                let Some(task) = state.queue.pop_front() else {
                    state.draining = false;
                    return;
                };
                state.last_started_at = Some(Instant::now());
                task
            };

            match (task.op)().await {
                Ok(value) => {
                    // Receiver may have been dropped; the send outcome is
                    // then nobody's business.
                    let _ = task.done.send(Ok(value));
                }
                Err(error) if task.retry_count < task.retry_limit => {
                    task.retry_count += 1;
                    tracing::debug!(
                        task_id = %task.id,
                        attempt = task.retry_count,
                        max_retries = task.retry_limit,
                        error = %error,
                        "Send failed, scheduling retry"
                    );
                    Self::schedule_retry(&shared, task);
                }
                Err(error) => {
                    tracing::warn!(
                        task_id = %task.id,
                        attempts = task.retry_count + 1,
                        error = %error,
                        "Send failed terminally, retries exhausted"
                    );
                    let _ = task.done.send(Err(DispatchError::RetriesExhausted {
                        attempts: task.retry_count + 1,
                        source: error,
                    }));
                }
            }
        }
    }

    /// Park a failed task for `retry_delay`, then reinsert it at the front
    /// and restart the drain loop if it went idle in the meantime. The task
    /// is invisible to the loop until the cooldown elapses.
    fn schedule_retry(shared: &Arc<Shared<T>>, task: QueuedSend<T>) {
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            tokio::time::sleep(shared.retry_delay).await;
            let mut state = shared.lock();
            state.queue.push_front(task);
            Self::spawn_drain_if_idle(&shared, &mut state);
        });
    }
}

//! Execution contexts.
//!
//! A call runs in two places: the request is built and sent on a
//! [`WorkContext`], and its result is handed to the caller on a
//! [`DeliveryContext`]. The two may be the same thread or not.
//!
//! - [`TokioContext`]: spawns onto a Tokio runtime (both roles)
//! - [`Inline`]: delivers on whichever thread finished the work
//! - [`MainQueue`]: queues deliveries until the host drains them, the way a
//!   UI main loop would

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::ClientBuildError;

/// A unit of delivery work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where requests are built and sent.
pub trait WorkContext: Send + Sync + 'static {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Where results are handed to the caller.
pub trait DeliveryContext: Send + Sync + 'static {
    fn deliver(&self, job: Job);
}

/// Runs work and deliveries as Tokio tasks.
#[derive(Clone, Debug)]
pub struct TokioContext {
    handle: Handle,
}

impl TokioContext {
    /// Use the runtime the caller is running on.
    pub fn current() -> Result<Self, ClientBuildError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| ClientBuildError::NoRuntime)
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl WorkContext for TokioContext {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.handle.spawn(task);
    }
}

impl DeliveryContext for TokioContext {
    fn deliver(&self, job: Job) {
        self.handle.spawn(async move { job() });
    }
}

/// Delivers results immediately on the worker that produced them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Inline;

impl DeliveryContext for Inline {
    #[inline]
    fn deliver(&self, job: Job) {
        job()
    }
}

/// A delivery queue drained explicitly by its owner.
///
/// Deliveries accumulate until the host calls [`run_pending`](Self::run_pending)
/// (e.g. once per frame) or awaits [`run_next`](Self::run_next). Clones share
/// the same queue.
#[derive(Clone, Debug)]
pub struct MainQueue {
    tx: mpsc::UnboundedSender<Job>,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    /// Run every queued delivery without waiting.
    ///
    /// Returns how many ran. Returns 0 if another caller is draining.
    pub fn run_pending(&self) -> usize {
        let Ok(mut rx) = self.rx.try_lock() else {
            return 0;
        };
        let mut ran = 0;
        while let Ok(job) = rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait for the next delivery and run it.
    pub async fn run_next(&self) {
        let job = self.rx.lock().await.recv().await;
        if let Some(job) = job {
            job();
        }
    }
}

impl DeliveryContext for MainQueue {
    fn deliver(&self, job: Job) {
        // The receiver lives as long as any clone of the queue.
        let _ = self.tx.send(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_job(counter: &Arc<AtomicUsize>) -> Job {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_inline_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        Inline.deliver(counter_job(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_main_queue_defers_until_drained() {
        let queue = MainQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        queue.deliver(counter_job(&counter));
        queue.clone().deliver(counter_job(&counter));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(queue.run_pending(), 0);
    }

    #[tokio::test]
    async fn test_main_queue_run_next() {
        let queue = MainQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let producer = queue.clone();
        let job = counter_job(&counter);
        tokio::spawn(async move { producer.deliver(job) });

        queue.run_next().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tokio_context() {
        let context = TokioContext::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        context.spawn(Box::pin(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[test]
    fn test_tokio_context_needs_runtime() {
        assert!(matches!(
            TokioContext::current(),
            Err(ClientBuildError::NoRuntime)
        ));
    }
}

//! Delivery channels.
//!
//! A call's result reaches the caller through one of two channels, chosen by
//! the endpoint's declared return shape:
//!
//! - **Callback mode**: a [`Callback`] pair supplied up front. Exactly one of
//!   its two functions runs, exactly once. There is no cancellation.
//! - **Stream mode**: a cold [`Call`]. Nothing happens until it is
//!   subscribed (or awaited, or polled as a stream). It then emits at most one
//!   value followed by completion, or exactly one error. Disposing the
//!   [`Subscription`] before that aborts the transport operation and
//!   suppresses every further event.
//!
//! # Call lifecycle
//!
//! ```text
//! Subscribed -> Sent -> Completed | Errored
//!      \          \
//!       `----------`--> Cancelled
//! ```
//!
//! Completed, Errored and Cancelled are terminal. The cancellation flag is
//! checked once the transport send resolves, and again when the delivery
//! job runs, so a disposed call never reaches its observer.

use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::ClientError;

/// Where a call is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Subscribed = 0,
    Sent = 1,
    Completed = 2,
    Errored = 3,
    Cancelled = 4,
}

impl Phase {
    fn from_u8(value: u8) -> Phase {
        match value {
            0 => Phase::Subscribed,
            1 => Phase::Sent,
            2 => Phase::Completed,
            3 => Phase::Errored,
            _ => Phase::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Errored | Phase::Cancelled)
    }
}

type Canceller = Box<dyn FnOnce() + Send + 'static>;

/// Shared state of one in-flight call.
pub(crate) struct CallState {
    phase: AtomicU8,
    canceller: Mutex<Option<Canceller>>,
}

impl CallState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            phase: AtomicU8::new(Phase::Subscribed as u8),
            canceller: Mutex::new(None),
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.phase() == Phase::Cancelled
    }

    fn transition(&self, from: Phase, to: Phase) -> bool {
        let moved = self
            .phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved {
            tracing::trace!(?from, ?to, "call phase");
        }
        moved
    }

    /// Subscribed -> Sent. Fails if the call was cancelled.
    pub(crate) fn mark_sent(&self) -> bool {
        self.transition(Phase::Subscribed, Phase::Sent)
    }

    /// Move to a terminal phase from any live one.
    ///
    /// Returns `false` if the call already ended; the caller must then drop
    /// its event.
    pub(crate) fn finish(&self, to: Phase) -> bool {
        self.transition(Phase::Sent, to) || self.transition(Phase::Subscribed, to)
    }

    /// Cancel the call and run its canceller.
    ///
    /// No-op once the call has reached a terminal phase.
    pub(crate) fn cancel(&self) {
        let cancelled =
            self.transition(Phase::Sent, Phase::Cancelled) || self.transition(Phase::Subscribed, Phase::Cancelled);
        if cancelled {
            self.run_canceller();
        }
    }

    /// Register the transport abort for this call.
    ///
    /// Runs it immediately if the call is already cancelled.
    pub(crate) fn install_canceller(&self, canceller: Canceller) {
        let mut slot = self.canceller.lock();
        if self.is_cancelled() {
            drop(slot);
            canceller();
        } else {
            *slot = Some(canceller);
        }
    }

    /// Run the canceller if it has not run yet.
    pub(crate) fn run_canceller(&self) {
        let canceller = self.canceller.lock().take();
        if let Some(canceller) = canceller {
            canceller();
        }
    }

    /// Drop the canceller without running it.
    pub(crate) fn clear_canceller(&self) {
        self.canceller.lock().take();
    }
}

/// Receives the terminal result of a call.
pub(crate) type Sink<T> = Box<dyn FnOnce(Result<T, ClientError>) + Send + 'static>;

/// Starts a call: given its state and sink, builds and sends the request.
pub(crate) type Starter<T> = Box<dyn FnOnce(Arc<CallState>, Sink<T>) + Send + 'static>;

/// Success/error callback pair for callback-mode endpoints.
///
/// The error callback receives the error's display text.
pub struct Callback<T> {
    sink: Sink<T>,
}

impl<T: Send + 'static> Callback<T> {
    pub fn new<S, E>(on_success: S, on_error: E) -> Self
    where
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        Self::from_result(move |result| match result {
            Ok(value) => on_success(value),
            Err(err) => on_error(err.to_string()),
        })
    }

    /// A callback that receives the structured result.
    pub fn from_result<F>(f: F) -> Self
    where
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        Self { sink: Box::new(f) }
    }

    pub(crate) fn into_sink(self) -> Sink<T> {
        self.sink
    }
}

impl<T> std::fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback").finish_non_exhaustive()
    }
}

/// Receives the events of a subscribed [`Call`].
///
/// A successful call produces `on_next` followed by `on_completed`; a failed
/// call produces a single `on_error`.
pub trait Observer<T>: Send + 'static {
    fn on_next(&mut self, value: T);

    fn on_error(&mut self, error: ClientError);

    fn on_completed(&mut self) {}
}

/// An observer built from closures.
pub struct FnObserver<N, E> {
    on_next: N,
    on_error: E,
}

impl<N, E> FnObserver<N, E> {
    pub fn new(on_next: N, on_error: E) -> Self {
        Self { on_next, on_error }
    }
}

impl<T, N, E> Observer<T> for FnObserver<N, E>
where
    N: FnMut(T) + Send + 'static,
    E: FnMut(ClientError) + Send + 'static,
{
    fn on_next(&mut self, value: T) {
        (self.on_next)(value)
    }

    fn on_error(&mut self, error: ClientError) {
        (self.on_error)(error)
    }
}

/// A cold, cancellable, single-result call.
///
/// Subscribe with [`subscribe`](Self::subscribe), `.await` it, or poll it
/// through [`into_stream`](Self::into_stream). Each of these consumes the
/// call, so a call is subscribed at most once.
///
/// # Example
///
/// ```ignore
/// let call: Call<Echo> = service.call("get", CallArgs::new().arg("abc").arg(123));
///
/// // Await the result (dropping the future cancels the request)
/// let echo = call.await?;
///
/// // Or subscribe an observer and keep the subscription alive
/// let subscription = service
///     .call::<Echo>("get", args)
///     .subscribe(FnObserver::new(|echo| println!("{echo:?}"), |err| eprintln!("{err}")));
/// ```
#[must_use = "calls do nothing unless subscribed or awaited"]
pub struct Call<T> {
    start: Starter<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> Call<T> {
    pub(crate) fn new(start: Starter<T>) -> Self {
        Self {
            start,
            _marker: PhantomData,
        }
    }

    /// Start the call and route its events to `observer`.
    ///
    /// Dropping the returned [`Subscription`] disposes it.
    pub fn subscribe<O: Observer<T>>(self, mut observer: O) -> Subscription {
        self.start_with(Box::new(move |result| match result {
            Ok(value) => {
                observer.on_next(value);
                observer.on_completed();
            }
            Err(err) => observer.on_error(err),
        }))
    }

    /// Poll the call as a stream of at most one item.
    pub fn into_stream(self) -> CallStream<T> {
        CallStream {
            state: StreamState::Idle(self),
        }
    }

    fn start_with(self, sink: Sink<T>) -> Subscription {
        let state = CallState::new();
        (self.start)(state.clone(), sink);
        Subscription { state: Some(state) }
    }
}

impl<T> std::fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> IntoFuture for Call<T> {
    type Output = Result<T, ClientError>;
    type IntoFuture = CallFuture<T>;

    fn into_future(self) -> CallFuture<T> {
        let (tx, rx) = oneshot::channel();
        let subscription = self.start_with(Box::new(move |result| {
            let _ = tx.send(result);
        }));
        CallFuture { rx, subscription }
    }
}

/// Handle to a subscribed call.
///
/// Dropping it disposes the call unless it was [`detach`](Self::detach)ed.
#[must_use = "dropping a subscription cancels the call"]
pub struct Subscription {
    state: Option<Arc<CallState>>,
}

impl Subscription {
    /// Cancel the call if it has not finished.
    ///
    /// Aborts the transport operation and suppresses every further event.
    pub fn dispose(&self) {
        if let Some(state) = &self.state {
            state.cancel();
        }
    }

    /// Let the call run to completion without holding the subscription.
    pub fn detach(mut self) {
        self.state = None;
    }

    pub fn phase(&self) -> Option<Phase> {
        self.state.as_ref().map(|s| s.phase())
    }

    pub fn is_disposed(&self) -> bool {
        self.phase() == Some(Phase::Cancelled)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("phase", &self.phase())
            .finish()
    }
}

/// Future returned by awaiting a [`Call`].
///
/// Dropping it before completion cancels the call.
#[must_use = "futures do nothing unless polled"]
pub struct CallFuture<T> {
    rx: oneshot::Receiver<Result<T, ClientError>>,
    subscription: Subscription,
}

impl<T> CallFuture<T> {
    pub fn phase(&self) -> Option<Phase> {
        self.subscription.phase()
    }
}

impl<T> Future for CallFuture<T> {
    type Output = Result<T, ClientError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ClientError::network(
                "",
                "call ended without a result",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

enum StreamState<T> {
    Idle(Call<T>),
    Running(CallFuture<T>),
    Done,
}

/// A [`Call`] viewed as a stream.
///
/// Yields `Ok(value)` or `Err(error)` once, then ends. The call starts on the
/// first poll; dropping the stream cancels it.
#[must_use = "streams do nothing unless polled"]
pub struct CallStream<T> {
    state: StreamState<T>,
}

impl<T: Send + 'static> Stream for CallStream<T> {
    type Item = Result<T, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match std::mem::replace(&mut self.state, StreamState::Done) {
                StreamState::Idle(call) => {
                    self.state = StreamState::Running(call.into_future());
                }
                StreamState::Running(mut future) => {
                    return match Pin::new(&mut future).poll(cx) {
                        Poll::Ready(result) => Poll::Ready(Some(result)),
                        Poll::Pending => {
                            self.state = StreamState::Running(future);
                            Poll::Pending
                        }
                    };
                }
                StreamState::Done => return Poll::Ready(None),
            }
        }
    }
}

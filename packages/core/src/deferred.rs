//! Single-threaded deferred results.
//!
//! A [`Deferred`] is settled exactly once, by the client, with either a value
//! or an error. Its outcome goes to exactly one consumer: a callback
//! registered with [`Deferred::on_settle`], a caller of
//! [`Deferred::try_take`], or a task awaiting it.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::{Error, Result};

type Callback<T> = Box<dyn FnOnce(Result<T>)>;

struct State<T> {
    settled: bool,
    outcome: Option<Result<T>>,
    callback: Option<Callback<T>>,
    waker: Option<Waker>,
}

/// The eventual result of a request.
///
/// Clones share the same state; the client keeps one to settle and hands
/// another to the caller.
pub struct Deferred<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> Deferred<T> {
    pub fn is_settled(&self) -> bool {
        self.state.borrow().settled
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T: 'static> Deferred<T> {
    pub fn pending() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                settled: false,
                outcome: None,
                callback: None,
                waker: None,
            })),
        }
    }

    /// A deferred that is already settled with `result`.
    pub fn settled(result: Result<T>) -> Self {
        let deferred = Self::pending();
        deferred.settle(result);
        deferred
    }

    pub fn resolve(&self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(&self, error: Error) {
        self.settle(Err(error));
    }

    /// Settle with `result`. Returns false if already settled.
    pub fn settle(&self, result: Result<T>) -> bool {
        let callback = {
            let mut state = self.state.borrow_mut();
            if state.settled {
                return false;
            }
            state.settled = true;
            match state.callback.take() {
                Some(callback) => callback,
                None => {
                    state.outcome = Some(result);
                    if let Some(waker) = state.waker.take() {
                        waker.wake();
                    }
                    return true;
                }
            }
        };
        // Run outside the borrow: callbacks may settle other deferreds or
        // register new callbacks on this one.
        callback(result);
        true
    }

    /// Take the outcome if the deferred has been settled and the outcome
    /// has not been consumed yet.
    pub fn try_take(&self) -> Option<Result<T>> {
        self.state.borrow_mut().outcome.take()
    }

    /// The outcome, or [`Error::NotReady`] while the deferred is pending.
    pub fn into_ready(self) -> Result<T> {
        self.try_take().unwrap_or(Err(Error::NotReady))
    }

    /// Run `callback` with the outcome once settled, immediately if it
    /// already is.
    pub fn on_settle(&self, callback: impl FnOnce(Result<T>) + 'static) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            match state.outcome.take() {
                Some(outcome) => outcome,
                None => {
                    if !state.settled {
                        state.callback = Some(Box::new(callback));
                    }
                    return;
                }
            }
        };
        callback(outcome);
    }

    /// Chain a fallible transformation of the outcome.
    pub fn then<U: 'static>(
        &self,
        transform: impl FnOnce(Result<T>) -> Result<U> + 'static,
    ) -> Deferred<U> {
        let next = Deferred::pending();
        let target = next.clone();
        self.on_settle(move |result| {
            target.settle(transform(result));
        });
        next
    }

    pub fn map<U: 'static>(&self, transform: impl FnOnce(T) -> U + 'static) -> Deferred<U> {
        self.then(|result| result.map(transform))
    }
}

impl<T: 'static> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        match state.outcome.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

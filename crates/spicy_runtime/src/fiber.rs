//! Fiber-style suspend/resume for incremental parsing.
//!
//! The original HILTI runtime suspends a parser mid-function on a real
//! stackful fiber when it runs out of input, then resumes it in place
//! once more bytes arrive. Rust has no portable stackful coroutine
//! primitive, so this crate substitutes a [`Resumable`] that wraps a
//! boxed, pinned `Future` built with `futures`/`async-recursion` (the
//! same two crates `logicaffeine_compile`'s
//! `crates/logicaffeine_compile/src/analysis` fixed-point workers use for
//! re-entrant async tree walks), and a "suspend for more input" point is
//! just an `.await` on [`NeedsInput`], a future that resolves `Pending`
//! exactly once before always being ready — one poll = one
//! generated-parser suspension.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use crate::failure::{Failure, Result};

/// A future that is `Pending` exactly once, then always `Ready`. Awaiting
/// one inside generated parsing code is how a field's parse procedure
/// yields control back to [`Resumable::resume`] when it needs more bytes
/// than the stream currently holds.
pub struct NeedsInput {
    polled: bool,
}

impl NeedsInput {
    pub fn new() -> Self {
        NeedsInput { polled: false }
    }
}

impl Default for NeedsInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Future for NeedsInput {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.polled {
            Poll::Ready(())
        } else {
            self.polled = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

fn noop_raw_waker() -> RawWaker {
    fn clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }
    fn no_op(_: *const ()) {}
    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
    RawWaker::new(std::ptr::null(), &VTABLE)
}

fn noop_waker() -> Waker {
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum FiberState {
    Suspended,
    Running,
    Done,
    Aborted,
}

/// A suspendable computation, modeling a single unit parse in flight.
/// Each [`resume`](Resumable::resume) call polls
/// the underlying future once; a `Pending` result means the body hit a
/// [`NeedsInput`] await and is waiting on more data, a `Ready` result
/// means the parse finished (successfully or with a [`Failure`]).
pub struct Resumable {
    future: Pin<Box<dyn Future<Output = Result<()>>>>,
    state: Rc<Cell<FiberState>>,
}

impl Resumable {
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = Result<()>> + 'static,
    {
        Resumable { future: Box::pin(body), state: Rc::new(Cell::new(FiberState::Suspended)) }
    }

    /// Drives the computation one step. Returns `Ok(true)` once it has
    /// fully completed, `Ok(false)` if it suspended waiting for more
    /// input, or `Err` if it failed. A suspended fiber that never resumes
    /// leaks no resources beyond the stream it holds a view of: resources
    /// are owned by the future itself and drop with it.
    pub fn resume(&mut self) -> Result<bool> {
        if self.state.get() == FiberState::Aborted {
            return Err(Failure::InvalidValue("resumed an aborted fiber".into()));
        }
        self.state.set(FiberState::Running);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        match self.future.as_mut().poll(&mut cx) {
            Poll::Pending => {
                self.state.set(FiberState::Suspended);
                Ok(false)
            }
            Poll::Ready(Ok(())) => {
                self.state.set(FiberState::Done);
                Ok(true)
            }
            Poll::Ready(Err(e)) => {
                self.state.set(FiberState::Done);
                Err(e)
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.state.get() == FiberState::Done
    }

    /// Tears down a suspended fiber without resuming it to completion,
    /// used when a sink disconnects a parser that never saw
    /// end-of-data. Further `resume` calls fail.
    ///
    /// Replaces the in-flight future with an inert one immediately, so
    /// whatever the body had captured across its last suspension point
    /// drops — and runs its destructors — right here, rather than
    /// whenever the `Resumable` itself later goes out of scope.
    pub fn abort(&mut self) {
        self.state.set(FiberState::Aborted);
        self.future = Box::pin(async { Ok(()) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_runs_to_completion_without_suspending() {
        let mut r = Resumable::new(async { Ok(()) });
        assert_eq!(r.resume().unwrap(), true);
        assert!(r.is_done());
    }

    #[test]
    fn resume_suspends_once_then_completes() {
        let mut r = Resumable::new(async {
            NeedsInput::new().await;
            Ok(())
        });
        assert_eq!(r.resume().unwrap(), false);
        assert!(!r.is_done());
        assert_eq!(r.resume().unwrap(), true);
        assert!(r.is_done());
    }

    #[test]
    fn resume_propagates_failure() {
        let mut r = Resumable::new(async { Err(Failure::ParseError("nope".into())) });
        assert!(r.resume().is_err());
    }

    #[test]
    fn abort_rejects_further_resume() {
        let mut r = Resumable::new(async {
            NeedsInput::new().await;
            Ok(())
        });
        assert_eq!(r.resume().unwrap(), false);
        r.abort();
        assert!(r.resume().is_err());
    }

    #[test]
    fn abort_runs_every_scoped_destructor_exactly_once() {
        let sentinel = Rc::new(());
        let captured = sentinel.clone();
        let mut r = Resumable::new(async move {
            let _held = captured;
            NeedsInput::new().await;
            Ok(())
        });
        assert_eq!(Rc::strong_count(&sentinel), 2);
        assert_eq!(r.resume().unwrap(), false);
        assert_eq!(Rc::strong_count(&sentinel), 2);
        r.abort();
        assert_eq!(Rc::strong_count(&sentinel), 1);
        // A second abort must not double-drop or panic.
        r.abort();
        assert_eq!(Rc::strong_count(&sentinel), 1);
    }
}

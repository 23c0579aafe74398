use std::{
	future::{Future, IntoFuture},
	pin::Pin,
	sync::OnceLock,
	task::{Context, Poll},
};

use async_channel as chan;
use tracing::trace;

/// Why a running task is being asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum InterruptionKind {
	/// Someone called `cancel` on the task
	Cancel,
	/// The engine is shutting down
	Shutdown,
}

/// A helper object that can be used to check if a cancellation was requested, so the
/// callable can decide the appropriated moment to stop, leaving no half written state behind.
///
/// Once an interruption is observed it sticks: every later check reports it again.
#[derive(Debug)]
pub struct Interrupter {
	interrupt_rx: chan::Receiver<InterruptionKind>,
	observed: OnceLock<InterruptionKind>,
}

impl Interrupter {
	pub(crate) const fn new(interrupt_rx: chan::Receiver<InterruptionKind>) -> Self {
		Self {
			interrupt_rx,
			observed: OnceLock::new(),
		}
	}

	/// An interrupter nobody can signal, for callables invoked outside the engine.
	#[must_use]
	pub fn detached() -> Self {
		let (_, interrupt_rx) = chan::bounded(1);
		Self::new(interrupt_rx)
	}

	/// Check if an interruption was requested, in a non-blocking manner.
	pub fn try_check_interrupt(&self) -> Option<InterruptionKind> {
		if let Some(kind) = self.observed.get() {
			return Some(*kind);
		}

		let kind = self.interrupt_rx.try_recv().ok()?;
		trace!(%kind, "Interrupter received interruption request");

		Some(*self.observed.get_or_init(|| kind))
	}

	#[must_use]
	pub fn is_interrupted(&self) -> bool {
		self.try_check_interrupt().is_some()
	}
}

/// Resolves once an interruption is requested; never resolves for a detached interrupter.
#[must_use = "`InterrupterFuture` does nothing unless polled"]
pub struct InterrupterFuture<'recv> {
	interrupter: &'recv Interrupter,
	fut: Pin<Box<chan::Recv<'recv, InterruptionKind>>>,
}

impl Future for InterrupterFuture<'_> {
	type Output = InterruptionKind;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		if let Some(kind) = self.interrupter.observed.get() {
			return Poll::Ready(*kind);
		}

		match self.fut.as_mut().poll(cx) {
			Poll::Ready(Ok(kind)) => {
				trace!(%kind, "Interrupter received interruption request");
				Poll::Ready(*self.interrupter.observed.get_or_init(|| kind))
			}
			// All senders are gone, nobody will ever interrupt us
			Poll::Ready(Err(chan::RecvError)) | Poll::Pending => Poll::Pending,
		}
	}
}

/// Lets async code `select` on `&interrupter` alongside its own work.
impl<'recv> IntoFuture for &'recv Interrupter {
	type Output = InterruptionKind;

	type IntoFuture = InterrupterFuture<'recv>;

	fn into_future(self) -> Self::IntoFuture {
		InterrupterFuture {
			interrupter: self,
			fut: Box::pin(self.interrupt_rx.recv()),
		}
	}
}

/// Returns `Err(ActionError::Canceled)` from the enclosing callable if the given
/// [`TaskContext`](crate::TaskContext) was asked to stop.
#[macro_export]
macro_rules! check_interruption {
	($ctx:ident) => {
		let ctx: &$crate::TaskContext = $ctx;

		if let Some(kind) = ctx.interrupter().try_check_interrupt() {
			::tracing::trace!(%kind, "Task was interrupted");
			return Err($crate::ActionError::Canceled);
		}
	};
}

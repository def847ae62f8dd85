// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	sync::Arc,
	thread::{self, ThreadId},
	time::Duration,
};

use tracing::{debug, trace};

use super::{Envelope, Shared, timer::TimerEntry};
use crate::{error::Result, request::AsyncRequest, scheduler::Scheduler};

/// Cloneable, thread-safe handle to a [`RunLoop`](super::RunLoop) hosting `S`.
///
/// Everything posted through a handle is queued and runs later on the loop's
/// thread. Work posted from a single thread runs in the order it was posted.
pub struct RunLoopHandle<S = ()> {
	shared: Arc<Shared<S>>,
}

impl<S> Clone for RunLoopHandle<S> {
	fn clone(&self) -> Self {
		Self {
			shared: self.shared.clone(),
		}
	}
}

impl<S: 'static> RunLoopHandle<S> {
	pub(super) fn new(shared: Arc<Shared<S>>) -> Self {
		Self {
			shared,
		}
	}

	/// Enqueue a plain task.
	pub fn post<F>(&self, task: F) -> Result<()>
	where
		F: FnOnce() + Send + 'static,
	{
		self.shared.send(Envelope::Task(Box::new(task)))
	}

	/// Enqueue a call that receives the loop's state.
	pub fn invoke<F>(&self, f: F) -> Result<()>
	where
		F: FnOnce(&mut S) + Send + 'static,
	{
		self.shared.send(Envelope::Invoke(Box::new(f)))
	}

	/// Enqueue `method` on this loop, then run `callback(result)` on `reply_to`.
	///
	/// Dropping the returned request before the callback runs suppresses the
	/// callback. If it is dropped before `method` starts, `method` is skipped
	/// as well.
	///
	/// # Panics
	///
	/// Panics if `reply_to` is not bound to the calling thread.
	pub fn invoke_with_callback<R, F, C>(&self, reply_to: &Scheduler, method: F, callback: C) -> AsyncRequest
	where
		R: Send + 'static,
		F: FnOnce(&mut S) -> R + Send + 'static,
		C: FnOnce(R) + Send + 'static,
	{
		assert!(reply_to.is_current(), "invoke_with_callback must reply to the calling thread's run loop");

		let (request, token) = AsyncRequest::new();
		let reply_to = reply_to.clone();
		let posted = self.invoke(move |state| {
			if token.is_cancelled() {
				trace!(request = token.id(), "skipping cancelled invocation");
				return;
			}

			let result = method(state);
			let id = token.id();
			let delivered = reply_to.post(move || {
				token.fire(move || callback(result));
			});
			if delivered.is_err() {
				debug!(request = id, "reply loop closed, dropping result");
			}
		});

		if let Err(err) = posted {
			debug!(request = request.id(), %err, "invocation not queued");
		}
		request
	}

	/// Run `callback` on the loop once `delay` has elapsed.
	///
	/// Dropping the returned request cancels the timer.
	pub fn schedule_once<F>(&self, delay: Duration, callback: F) -> AsyncRequest
	where
		F: FnOnce(&mut S) + Send + 'static,
	{
		let (request, token) = AsyncRequest::new();
		self.register(request.id(), TimerEntry::once(delay, Box::new(callback), token));
		request
	}

	/// Run `callback` on the loop every `interval` until it returns `false`.
	///
	/// Dropping the returned request cancels the timer.
	pub fn schedule_repeat<F>(&self, interval: Duration, callback: F) -> AsyncRequest
	where
		F: FnMut(&mut S) -> bool + Send + 'static,
	{
		let (request, token) = AsyncRequest::new();
		self.register(request.id(), TimerEntry::repeat(interval, Box::new(callback), token));
		request
	}

	fn register(&self, id: u64, entry: TimerEntry<S>) {
		if self.shared.send(Envelope::Timer(entry)).is_err() {
			debug!(request = id, "timer not registered, run loop closed");
		}
	}

	/// Ask the loop to return from its current or next `run`.
	///
	/// Safe from any thread. Calls made while a stop marker is queued,
	/// including one racing with the loop taking that marker, coalesce into
	/// it.
	pub fn stop(&self) {
		self.shared.request_stop();
	}

	/// Returns a type-erased handle to the same loop.
	pub fn scheduler(&self) -> Scheduler {
		Scheduler::new(self.shared.clone())
	}

	/// The thread the loop is bound to.
	pub fn thread_id(&self) -> ThreadId {
		self.shared.thread
	}

	/// Returns `true` when called from the loop's own thread.
	pub fn is_current(&self) -> bool {
		self.shared.thread == thread::current().id()
	}

	pub fn name(&self) -> Option<&str> {
		self.shared.name.as_deref()
	}
}

impl<S: 'static> From<&RunLoopHandle<S>> for Scheduler {
	fn from(handle: &RunLoopHandle<S>) -> Self {
		handle.scheduler()
	}
}

impl<S> fmt::Debug for RunLoopHandle<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RunLoopHandle").field("name", &self.shared.name).field("thread", &self.shared.thread).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::{
			Arc,
			atomic::{AtomicUsize, Ordering},
			mpsc,
		},
		thread,
	};

	use super::*;
	use crate::run_loop::RunLoop;

	#[test]
	fn test_invoke_with_callback_on_same_loop() {
		let run_loop = RunLoop::<u32>::hosting(Some("counter".into()));
		let handle = run_loop.handle();
		let reply = run_loop.scheduler();
		let (tx, rx) = mpsc::channel();

		let stopper = handle.clone();
		let _request = handle.invoke_with_callback(
			&reply,
			|count| {
				*count += 1;
				*count
			},
			move |value| {
				tx.send(value).unwrap();
				stopper.stop();
			},
		);

		let mut count = 41;
		run_loop.run_with(&mut count);
		assert_eq!(rx.try_recv().unwrap(), 42);
	}

	#[test]
	fn test_request_dropped_before_start_skips_method() {
		let run_loop = RunLoop::<u32>::hosting(None);
		let handle = run_loop.handle();
		let reply = run_loop.scheduler();
		let fired = Arc::new(AtomicUsize::new(0));

		let fired_clone = fired.clone();
		let request = handle.invoke_with_callback(
			&reply,
			|count| {
				*count += 1;
			},
			move |_| {
				fired_clone.fetch_add(1, Ordering::SeqCst);
			},
		);
		drop(request);
		handle.stop();

		let mut count = 0;
		run_loop.run_with(&mut count);
		assert_eq!(count, 0);
		assert_eq!(fired.load(Ordering::SeqCst), 0);
	}

	#[test]
	#[should_panic(expected = "calling thread's run loop")]
	fn test_foreign_reply_loop_panics() {
		let (tx, rx) = mpsc::channel();
		let (done_tx, done_rx) = mpsc::channel::<()>();
		let foreign = thread::spawn(move || {
			let run_loop = RunLoop::new();
			tx.send(run_loop.scheduler()).unwrap();
			let _ = done_rx.recv();
		});
		let foreign_reply = rx.recv().unwrap();

		let run_loop = RunLoop::<()>::hosting(None);
		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
			run_loop.handle().invoke_with_callback(&foreign_reply, |_| (), |_| ())
		}));
		drop(done_tx);
		foreign.join().unwrap();
		if let Err(panic) = result {
			std::panic::resume_unwind(panic);
		}
	}

	#[test]
	fn test_scheduler_from_handle() {
		let run_loop = RunLoop::new();
		let handle = run_loop.handle();
		let scheduler = Scheduler::from(&handle);
		assert_eq!(scheduler.thread_id(), handle.thread_id());
		assert!(scheduler.is_current());

		scheduler.post(move || handle.stop()).unwrap();
		run_loop.run();
	}
}

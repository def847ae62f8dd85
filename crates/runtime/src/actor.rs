// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! A worker object hosted on its own thread.
//!
//! An [`Actor`] couples one OS thread, one [`RunLoop`] and one worker value:
//! 1. The thread is spawned and binds a run loop
//! 2. The worker is constructed on that thread
//! 3. [`Actor::spawn`] returns only after the worker exists
//! 4. The loop runs invocations against the worker until the actor is dropped
//! 5. Drop stops the loop, the thread drops the worker and then the loop, and
//!    the caller joins the thread
//!
//! The worker never leaves its thread, so it does not need to be `Send`.

use std::{
	fmt,
	sync::{
		Arc,
		atomic::{AtomicU8, Ordering},
	},
	thread::{self, JoinHandle},
};

use crossbeam_channel::bounded;
use tracing::{debug, error, warn};

use crate::{
	context::ThreadContext,
	error::{Result, RuntimeError},
	request::AsyncRequest,
	run_loop::{RunLoop, RunLoopHandle},
	scheduler::Scheduler,
};

/// Lifecycle of an actor. Every actor passes through each state once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ActorState {
	/// Thread spawned, worker not constructed yet.
	Starting,
	/// Worker constructed, loop not entered yet.
	Ready,
	/// Loop is servicing invocations.
	Running,
	/// Stop requested, waiting for the thread to exit.
	Stopping,
	/// Thread joined. No worker code runs anymore.
	Joined,
}

impl ActorState {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => ActorState::Starting,
			1 => ActorState::Ready,
			2 => ActorState::Running,
			3 => ActorState::Stopping,
			_ => ActorState::Joined,
		}
	}
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
	fn new(state: ActorState) -> Self {
		Self(AtomicU8::new(state as u8))
	}

	fn get(&self) -> ActorState {
		ActorState::from_u8(self.0.load(Ordering::Acquire))
	}

	fn set(&self, state: ActorState) {
		self.0.store(state as u8, Ordering::Release);
	}

	fn advance(&self, from: ActorState, to: ActorState) -> bool {
		self.0.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire).is_ok()
	}
}

/// Read-only view of an actor's lifecycle that outlives the actor.
#[derive(Debug, Clone)]
pub struct ActorWatch {
	state: Arc<StateCell>,
}

impl ActorWatch {
	pub fn state(&self) -> ActorState {
		self.state.get()
	}
}

/// A worker of type `W` running on a dedicated thread.
///
/// Methods are scheduled with [`invoke`](Actor::invoke) and
/// [`invoke_with_callback`](Actor::invoke_with_callback); calls from one
/// thread run in the order they were made. Dropping the actor blocks until
/// the worker has been dropped and the thread has exited.
pub struct Actor<W: 'static> {
	context: ThreadContext,
	handle: RunLoopHandle<W>,
	state: Arc<StateCell>,
	thread: Option<JoinHandle<()>>,
}

impl<W: 'static> Actor<W> {
	/// Spawns the thread and constructs the worker on it.
	///
	/// `factory` runs on the new thread and receives the handle of the loop
	/// the worker will live on, for posting work back to itself.
	///
	/// Blocks until the worker is constructed.
	pub fn spawn<F>(context: ThreadContext, factory: F) -> Result<Self>
	where
		F: FnOnce(&RunLoopHandle<W>) -> W + Send + 'static,
	{
		let state = Arc::new(StateCell::new(ActorState::Starting));
		let (ready_tx, ready_rx) = bounded::<RunLoopHandle<W>>(1);

		let thread_state = state.clone();
		let thread_context = context.clone();
		let thread = thread::Builder::new().name(context.name.clone()).spawn(move || {
			let name = thread_context.name;
			thread_context.priority.apply();

			let run_loop = RunLoop::<W>::hosting(Some(name.clone()));
			let handle = run_loop.handle();
			let mut worker = factory(&handle);

			thread_state.set(ActorState::Ready);
			if ready_tx.send(handle).is_err() {
				return;
			}
			thread_state.advance(ActorState::Ready, ActorState::Running);
			debug!(actor = %name, "worker ready");

			run_loop.run_with(&mut worker);
			if thread_state.advance(ActorState::Running, ActorState::Stopping) {
				warn!(actor = %name, "run loop stopped outside actor teardown");
			}

			drop(worker);
			drop(run_loop);
			debug!(actor = %name, "worker torn down");
		})?;

		match ready_rx.recv() {
			Ok(handle) => Ok(Self {
				context,
				handle,
				state,
				thread: Some(thread),
			}),
			Err(_) => {
				// The factory panicked and dropped the sender while unwinding.
				let _ = thread.join();
				state.set(ActorState::Joined);
				error!(actor = %context.name, "worker failed during construction");
				Err(RuntimeError::WorkerStartup {
					name: context.name,
				})
			}
		}
	}

	/// Schedules `f` on the worker thread. Returns immediately.
	///
	/// Dropped with a warning once the worker's loop has stopped.
	pub fn invoke<F>(&self, f: F)
	where
		F: FnOnce(&mut W) + Send + 'static,
	{
		if self.state() >= ActorState::Stopping {
			warn!(actor = %self.context.name, "invocation dropped, actor is stopping");
			return;
		}
		if let Err(err) = self.handle.invoke(f) {
			warn!(actor = %self.context.name, %err, "invocation dropped");
		}
	}

	/// Schedules `method` on the worker thread and delivers its result to
	/// `callback` on `reply_to`, which must be the calling thread's loop.
	///
	/// Dropping the returned request before delivery suppresses the callback.
	///
	/// # Panics
	///
	/// Panics if `reply_to` is not bound to the calling thread.
	pub fn invoke_with_callback<R, F, C>(&self, reply_to: &Scheduler, method: F, callback: C) -> AsyncRequest
	where
		R: Send + 'static,
		F: FnOnce(&mut W) -> R + Send + 'static,
		C: FnOnce(R) + Send + 'static,
	{
		self.handle.invoke_with_callback(reply_to, method, callback)
	}

	/// Handle to the worker's run loop.
	///
	/// Stopping the loop through this handle ends the worker thread early;
	/// the actor then reports [`ActorState::Stopping`] until it is dropped.
	pub fn handle(&self) -> &RunLoopHandle<W> {
		&self.handle
	}

	pub fn context(&self) -> &ThreadContext {
		&self.context
	}

	pub fn name(&self) -> &str {
		&self.context.name
	}

	pub fn state(&self) -> ActorState {
		self.state.get()
	}

	/// Returns a lifecycle view that stays valid after the actor is dropped.
	pub fn watch(&self) -> ActorWatch {
		ActorWatch {
			state: self.state.clone(),
		}
	}
}

impl<W: 'static> Drop for Actor<W> {
	fn drop(&mut self) {
		self.state.set(ActorState::Stopping);
		self.handle.stop();

		if let Some(thread) = self.thread.take()
			&& thread.join().is_err()
		{
			error!(actor = %self.context.name, "worker thread panicked");
		}

		self.state.set(ActorState::Joined);
		debug!(actor = %self.context.name, "actor joined");
	}
}

impl<W: 'static> fmt::Debug for Actor<W> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Actor").field("name", &self.context.name).field("state", &self.state()).finish()
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use tracing::debug;

use crate::{
	actor::Actor,
	context::ThreadContext,
	error::{Result, RuntimeError},
	request::AsyncRequest,
	run_loop::RunLoopHandle,
	scheduler::Scheduler,
};

/// A fixed set of identical actors, each on its own thread.
///
/// Threads are named `{name}-{index}` after the pool's [`ThreadContext`].
/// Invocations are dispatched round-robin, so ordering only holds per worker,
/// not across the pool.
pub struct WorkerPool<W: 'static> {
	actors: Vec<Actor<W>>,
	next: AtomicUsize,
}

impl<W: 'static> WorkerPool<W> {
	/// Spawns `size` actors, constructing each worker with `factory` on its
	/// own thread.
	///
	/// If any actor fails to start, the ones already running are stopped and
	/// joined before the error is returned. A `size` of zero is rejected with
	/// [`RuntimeError::EmptyPool`].
	pub fn spawn<F>(size: usize, context: ThreadContext, factory: F) -> Result<Self>
	where
		F: Fn(&RunLoopHandle<W>) -> W + Send + Sync + 'static,
	{
		if size == 0 {
			return Err(RuntimeError::EmptyPool {
				name: context.name,
			});
		}

		let factory = Arc::new(factory);
		let actors = (0..size)
			.map(|index| {
				let factory = factory.clone();
				let context = context.clone().with_name(format!("{}-{index}", context.name));
				Actor::spawn(context, move |handle| factory(handle))
			})
			.collect::<Result<Vec<_>>>()?;

		debug!(pool = %context.name, size, "worker pool started");
		Ok(Self {
			actors,
			next: AtomicUsize::new(0),
		})
	}

	fn pick(&self) -> &Actor<W> {
		let index = self.next.fetch_add(1, Ordering::Relaxed) % self.actors.len();
		&self.actors[index]
	}

	/// Schedules `f` on the next worker in turn.
	pub fn invoke<F>(&self, f: F)
	where
		F: FnOnce(&mut W) + Send + 'static,
	{
		self.pick().invoke(f);
	}

	/// Schedules `method` on the next worker in turn and delivers the result
	/// to `callback` on `reply_to`. See [`Actor::invoke_with_callback`].
	pub fn invoke_with_callback<R, F, C>(&self, reply_to: &Scheduler, method: F, callback: C) -> AsyncRequest
	where
		R: Send + 'static,
		F: FnOnce(&mut W) -> R + Send + 'static,
		C: FnOnce(R) + Send + 'static,
	{
		self.pick().invoke_with_callback(reply_to, method, callback)
	}

	/// Schedules `f` on every worker.
	pub fn broadcast<F>(&self, f: F)
	where
		F: Fn(&mut W) + Send + Sync + 'static,
	{
		let f = Arc::new(f);
		for actor in &self.actors {
			let f = f.clone();
			actor.invoke(move |worker| f(worker));
		}
	}

	pub fn actors(&self) -> &[Actor<W>] {
		&self.actors
	}

	pub fn len(&self) -> usize {
		self.actors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actors.is_empty()
	}
}

impl<W: 'static> fmt::Debug for WorkerPool<W> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WorkerPool").field("actors", &self.actors).finish()
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Cooperative, single-threaded run loop.
//!
//! A [`RunLoop`] is bound to the thread that created it and executes queued
//! work there, one item at a time:
//! - plain tasks posted through a [`RunLoopHandle`] or [`Scheduler`]
//! - invocations that receive the loop's state (`&mut S`)
//! - timers, fired in deadline order between queued items
//!
//! The loop value itself is `!Send`; other threads talk to it only through
//! handles.

use std::{
	cell::{Cell, RefCell},
	collections::BinaryHeap,
	marker::PhantomData,
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	thread::{self, ThreadId},
	time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, trace};

use crate::{
	error::{Result, RuntimeError},
	scheduler::{Scheduler, Task, TaskSink},
};

mod handle;
pub(crate) mod timer;

pub use handle::RunLoopHandle;
use timer::TimerEntry;

/// An invocation receiving the state hosted by a run loop.
pub(crate) type Invocation<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

pub(crate) enum Envelope<S> {
	Task(Task),
	Invoke(Invocation<S>),
	Timer(TimerEntry<S>),
	Stop,
}

/// Smallest heap size at which cancelled timers are swept out in bulk.
const MIN_COMPACT_AT: usize = 64;

thread_local! {
	static LOOP_BOUND: Cell<bool> = const { Cell::new(false) };
}

pub(crate) struct Shared<S> {
	sender: Sender<Envelope<S>>,
	thread: ThreadId,
	name: Option<String>,
	/// Set while a stop marker is queued and not yet consumed.
	stopping: AtomicBool,
}

impl<S> Shared<S> {
	fn send(&self, envelope: Envelope<S>) -> Result<()> {
		self.sender.send(envelope).map_err(|_| RuntimeError::LoopClosed)
	}

	fn request_stop(&self) {
		if self.stopping.swap(true, Ordering::AcqRel) {
			return;
		}
		if self.sender.send(Envelope::Stop).is_err() {
			trace!(run_loop = self.label(), "stop requested on a dropped run loop");
		}
	}

	fn label(&self) -> &str {
		self.name.as_deref().unwrap_or("anonymous")
	}
}

impl<S: 'static> TaskSink for Shared<S> {
	fn post_task(&self, task: Task) -> Result<()> {
		self.send(Envelope::Task(task))
	}

	fn stop(&self) {
		self.request_stop();
	}

	fn thread_id(&self) -> ThreadId {
		self.thread
	}

	fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}
}

/// A run loop bound to the current thread, hosting state of type `S`.
///
/// Plain loops use `S = ()` and are driven with [`RunLoop::run`]; loops that
/// host a worker are driven with [`RunLoop::run_with`].
pub struct RunLoop<S = ()> {
	shared: Arc<Shared<S>>,
	receiver: Receiver<Envelope<S>>,
	timers: RefCell<BinaryHeap<TimerEntry<S>>>,
	/// Heap size that triggers the next sweep of cancelled timers.
	compact_at: Cell<usize>,
	running: Cell<bool>,
	_bound: PhantomData<*const ()>,
}

impl RunLoop<()> {
	/// Binds a new plain run loop to the current thread.
	///
	/// # Panics
	///
	/// Panics if another run loop is already bound to this thread.
	pub fn new() -> Self {
		Self::build(None)
	}

	/// Binds a new named plain run loop to the current thread.
	///
	/// # Panics
	///
	/// Panics if another run loop is already bound to this thread.
	pub fn with_name(name: impl Into<String>) -> Self {
		Self::build(Some(name.into()))
	}

	/// Runs a plain loop until stopped. See [`RunLoop::run_with`].
	pub fn run(&self) {
		self.run_with(&mut ());
	}
}

impl<S: 'static> RunLoop<S> {
	/// Binds a new run loop hosting state of type `S` to the current thread.
	///
	/// # Panics
	///
	/// Panics if another run loop is already bound to this thread.
	pub fn hosting(name: Option<String>) -> Self {
		Self::build(name)
	}

	fn build(name: Option<String>) -> Self {
		LOOP_BOUND.with(|bound| {
			assert!(!bound.replace(true), "a run loop is already bound to this thread");
		});

		let (sender, receiver) = unbounded();
		Self {
			shared: Arc::new(Shared {
				sender,
				thread: thread::current().id(),
				name,
				stopping: AtomicBool::new(false),
			}),
			receiver,
			timers: RefCell::new(BinaryHeap::new()),
			compact_at: Cell::new(MIN_COMPACT_AT),
			running: Cell::new(false),
			_bound: PhantomData,
		}
	}

	/// Returns a cross-thread handle to this loop.
	pub fn handle(&self) -> RunLoopHandle<S> {
		RunLoopHandle::new(self.shared.clone())
	}

	/// Returns a type-erased handle usable as a reply address.
	pub fn scheduler(&self) -> Scheduler {
		Scheduler::new(self.shared.clone())
	}

	/// Ask the loop to return from its current or next `run`.
	///
	/// Calls made while a stop marker is queued, including one racing with
	/// the loop taking that marker, coalesce into it.
	pub fn stop(&self) {
		self.shared.request_stop();
	}

	pub fn name(&self) -> Option<&str> {
		self.shared.name.as_deref()
	}

	/// Number of queued items not yet taken by the loop.
	pub fn pending(&self) -> usize {
		self.receiver.len()
	}

	/// Runs queued work and timers until a stop marker is reached.
	///
	/// Work queued before [`stop`](RunLoopHandle::stop) was called is drained
	/// first. Work queued after the marker stays queued for the next call.
	///
	/// # Panics
	///
	/// Panics when called re-entrantly from a task of this loop.
	pub fn run_with(&self, state: &mut S) {
		assert!(!self.running.replace(true), "run loop is already running");
		let _running = RunningGuard(&self.running);
		debug!(run_loop = self.shared.label(), "run loop started");

		loop {
			self.prune_cancelled_timers();
			let envelope = match self.next_timeout() {
				Some(Duration::ZERO) => self.receiver.try_recv().ok(),
				Some(timeout) => self.receiver.recv_timeout(timeout).ok(),
				// The loop holds a sender itself, so this only returns with a message.
				None => self.receiver.recv().ok(),
			};

			if let Some(envelope) = envelope {
				match envelope {
					Envelope::Task(task) => task(),
					Envelope::Invoke(invocation) => invocation(state),
					Envelope::Timer(entry) => self.push_timer(entry),
					Envelope::Stop => {
						// A stop() landing between the dequeue and this store is
						// absorbed by the marker being consumed.
						self.shared.stopping.store(false, Ordering::Release);
						break;
					}
				}
			}

			self.fire_due_timers(state);
		}

		debug!(run_loop = self.shared.label(), "run loop stopped");
	}

	fn push_timer(&self, entry: TimerEntry<S>) {
		let mut timers = self.timers.borrow_mut();
		timers.push(entry);
		if timers.len() >= self.compact_at.get() {
			timers.retain(|entry| !entry.is_cancelled());
			self.compact_at.set((timers.len() * 2).max(MIN_COMPACT_AT));
			trace!(run_loop = self.shared.label(), timers = timers.len(), "swept cancelled timers");
		}
	}

	/// Drops cancelled timers sitting at the top of the heap.
	fn prune_cancelled_timers(&self) {
		let mut timers = self.timers.borrow_mut();
		while timers.peek().is_some_and(TimerEntry::is_cancelled) {
			timers.pop();
		}
	}

	fn next_timeout(&self) -> Option<Duration> {
		self.timers.borrow().peek().map(|entry| entry.deadline().saturating_duration_since(Instant::now()))
	}

	fn fire_due_timers(&self, state: &mut S) {
		let now = Instant::now();
		let mut rearmed = Vec::new();

		loop {
			let due = {
				let mut timers = self.timers.borrow_mut();
				match timers.peek() {
					Some(entry) if entry.deadline() <= now => timers.pop(),
					_ => None,
				}
			};
			let Some(entry) = due else {
				break;
			};
			if let Some(next) = entry.fire(state, now) {
				rearmed.push(next);
			}
		}

		if !rearmed.is_empty() {
			self.timers.borrow_mut().extend(rearmed);
		}
	}
}

impl Default for RunLoop<()> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S> Drop for RunLoop<S> {
	fn drop(&mut self) {
		let discarded = self.receiver.try_iter().count();
		if discarded > 0 {
			debug!(run_loop = self.shared.label(), discarded, "run loop dropped with queued work");
		}
		LOOP_BOUND.with(|bound| bound.set(false));
	}
}

struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Type-erased reference to a run loop.
//!
//! A [`Scheduler`] only accepts plain tasks, which makes it usable as the reply
//! address of a cross-thread invocation regardless of the state type the
//! target loop hosts.

use std::{
	fmt,
	sync::Arc,
	thread::{self, ThreadId},
};

use crate::error::Result;

/// A deferred unit of work posted to a run loop.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub(crate) trait TaskSink: Send + Sync {
	fn post_task(&self, task: Task) -> Result<()>;

	fn stop(&self);

	fn thread_id(&self) -> ThreadId;

	fn name(&self) -> Option<&str>;
}

/// Cloneable handle that posts tasks to one run loop from any thread.
#[derive(Clone)]
pub struct Scheduler {
	sink: Arc<dyn TaskSink>,
}

impl Scheduler {
	pub(crate) fn new(sink: Arc<dyn TaskSink>) -> Self {
		Self {
			sink,
		}
	}

	/// Enqueue a task on the loop's own thread.
	///
	/// Never runs the task inline, even when called from the loop's thread.
	pub fn post<F>(&self, task: F) -> Result<()>
	where
		F: FnOnce() + Send + 'static,
	{
		self.sink.post_task(Box::new(task))
	}

	/// Ask the loop to return from its current or next `run`.
	pub fn stop(&self) {
		self.sink.stop();
	}

	/// The thread the loop is bound to.
	pub fn thread_id(&self) -> ThreadId {
		self.sink.thread_id()
	}

	/// Returns `true` when called from the loop's own thread.
	pub fn is_current(&self) -> bool {
		self.sink.thread_id() == thread::current().id()
	}

	pub fn name(&self) -> Option<&str> {
		self.sink.name()
	}
}

impl fmt::Debug for Scheduler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Scheduler").field("name", &self.name()).field("thread", &self.thread_id()).finish()
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Cancellation handles for in-flight asynchronous operations.
//!
//! An operation is represented by a pair sharing one state cell:
//! - [`AsyncRequest`]: held by the issuer. Dropping it cancels the operation.
//! - [`RequestToken`]: travels with the work and gates delivery of the result.
//!
//! The token checks the shared phase immediately before running the callback,
//! so a result that is already queued for delivery is still suppressed when
//! the request is dropped first.

use std::{
	fmt,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	thread::{self, ThreadId},
};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	/// Waiting for delivery.
	Pending,
	/// The request was dropped before delivery.
	Cancelled,
	/// A callback is executing on the given thread.
	Delivering(ThreadId),
	/// The callback has run.
	Delivered,
	/// The delivering side went away without a result.
	Abandoned,
}

struct RequestState {
	id: u64,
	phase: Mutex<Phase>,
	settled: Condvar,
}

/// Counter for generating unique request IDs.
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_request_id() -> u64 {
	REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Handle to one outstanding asynchronous operation.
///
/// Dropping the handle before the operation's callback has run guarantees the
/// callback never runs. Dropping it after delivery has no effect.
///
/// When the handle is dropped on a thread other than the one currently running
/// the callback, the drop blocks until that callback returns. Once `drop`
/// returns, no callback for this request is running or will run.
pub struct AsyncRequest {
	state: Arc<RequestState>,
}

impl AsyncRequest {
	/// Creates a request handle and the token that delivers its result.
	pub fn new() -> (Self, RequestToken) {
		let state = Arc::new(RequestState {
			id: next_request_id(),
			phase: Mutex::new(Phase::Pending),
			settled: Condvar::new(),
		});

		(
			Self {
				state: state.clone(),
			},
			RequestToken {
				state,
			},
		)
	}

	/// Unique request ID.
	pub fn id(&self) -> u64 {
		self.state.id
	}

	/// Returns `true` while the callback has neither run nor been abandoned.
	pub fn is_pending(&self) -> bool {
		*self.state.phase.lock() == Phase::Pending
	}

	/// Returns `true` once the callback has run, or the operation was abandoned
	/// without producing a result.
	pub fn is_finished(&self) -> bool {
		matches!(*self.state.phase.lock(), Phase::Delivered | Phase::Abandoned)
	}

	/// Cancels the operation. Equivalent to dropping the handle.
	pub fn cancel(self) {
		drop(self);
	}
}

impl Drop for AsyncRequest {
	fn drop(&mut self) {
		let current = thread::current().id();
		let mut phase = self.state.phase.lock();
		loop {
			match *phase {
				Phase::Pending => {
					*phase = Phase::Cancelled;
					trace!(request = self.state.id, "request cancelled");
					return;
				}
				Phase::Delivering(owner) if owner != current => {
					self.state.settled.wait(&mut phase);
				}
				_ => return,
			}
		}
	}
}

impl fmt::Debug for AsyncRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AsyncRequest").field("id", &self.state.id).field("phase", &*self.state.phase.lock()).finish()
	}
}

/// Delivering side of an [`AsyncRequest`].
///
/// Dropping a token that never delivered marks the request as abandoned.
pub struct RequestToken {
	state: Arc<RequestState>,
}

impl RequestToken {
	/// Unique request ID, shared with the issuing handle.
	pub fn id(&self) -> u64 {
		self.state.id
	}

	/// Check if the issuer dropped its handle.
	pub fn is_cancelled(&self) -> bool {
		*self.state.phase.lock() == Phase::Cancelled
	}

	/// Runs `callback` unless the request was cancelled.
	///
	/// Returns `true` if the callback ran.
	pub fn fire<F: FnOnce()>(self, callback: F) -> bool {
		let Some(_delivery) = self.enter(Phase::Delivered) else {
			return false;
		};
		callback();
		true
	}

	/// Runs one tick of a repeating operation unless the request was cancelled.
	///
	/// The callback returns whether the operation continues. Returns `false`
	/// when the request was cancelled or the callback asked to finish.
	pub fn tick<F: FnOnce() -> bool>(&self, callback: F) -> bool {
		let Some(mut delivery) = self.enter(Phase::Delivered) else {
			return false;
		};
		let keep = callback();
		if keep {
			delivery.exit = Phase::Pending;
		}
		keep
	}

	fn enter(&self, exit: Phase) -> Option<Delivery<'_>> {
		let mut phase = self.state.phase.lock();
		if *phase != Phase::Pending {
			return None;
		}
		*phase = Phase::Delivering(thread::current().id());
		Some(Delivery {
			state: &self.state,
			exit,
		})
	}
}

impl Drop for RequestToken {
	fn drop(&mut self) {
		let mut phase = self.state.phase.lock();
		if *phase == Phase::Pending {
			*phase = Phase::Abandoned;
			trace!(request = self.state.id, "request abandoned");
		}
	}
}

impl fmt::Debug for RequestToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RequestToken").field("id", &self.state.id).finish()
	}
}

/// Leaves the delivering phase, also when the callback unwinds.
struct Delivery<'a> {
	state: &'a RequestState,
	exit: Phase,
}

impl Drop for Delivery<'_> {
	fn drop(&mut self) {
		*self.state.phase.lock() = self.exit;
		self.state.settled.notify_all();
	}
}

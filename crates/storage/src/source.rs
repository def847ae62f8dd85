// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mooring_runtime::{AsyncRequest, Scheduler};

use crate::{resource::Resource, response::Response};

/// Receives the response of a request, on the requesting thread.
pub type Callback = Box<dyn FnOnce(Response) + Send + 'static>;

/// An asynchronous source of resources.
pub trait FileSource: Send + Sync {
	/// Requests `resource`.
	///
	/// `callback` runs exactly once, later, on the run loop behind `reply_to`,
	/// which must be bound to the calling thread. Dropping the returned
	/// request before that happens guarantees `callback` never runs, even if
	/// the response is already queued. Distinct requests complete in no
	/// particular order, including two requests for the same resource.
	///
	/// # Panics
	///
	/// Panics if `reply_to` is not bound to the calling thread.
	fn request(&self, resource: Resource, reply_to: &Scheduler, callback: Callback) -> AsyncRequest;
}

/// A blocking fetch implementation, hosted on a worker thread.
///
/// Fetchers never leave the thread they were created on, so they need not be
/// `Send`.
pub trait Fetcher: 'static {
	fn fetch(&mut self, resource: &Resource) -> Response;
}

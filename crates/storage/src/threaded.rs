// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mooring_runtime::{AsyncRequest, Result, Scheduler, ThreadContext, WorkerPool};
use tracing::{debug, trace};

use crate::{
	config::FileSourceConfig,
	resource::Resource,
	response::Outcome,
	source::{Callback, Fetcher, FileSource},
};

/// A [`FileSource`] that runs blocking fetchers on a pool of worker threads.
///
/// Each worker thread owns one fetcher built by the factory passed to
/// [`spawn`](ThreadedFileSource::spawn). Requests are spread round-robin over
/// the workers and responses are marshaled back to the requesting thread's
/// run loop.
pub struct ThreadedFileSource<F: Fetcher> {
	pool: WorkerPool<F>,
}

impl<F: Fetcher> ThreadedFileSource<F> {
	pub fn spawn<M>(config: FileSourceConfig, make_fetcher: M) -> Result<Self>
	where
		M: Fn() -> F + Send + Sync + 'static,
	{
		let context = ThreadContext::new(config.thread_name).with_priority(config.priority);
		let pool = WorkerPool::spawn(config.workers, context, move |_| make_fetcher())?;
		Ok(Self {
			pool,
		})
	}

	pub fn workers(&self) -> usize {
		self.pool.len()
	}
}

impl<F: Fetcher> FileSource for ThreadedFileSource<F> {
	fn request(&self, resource: Resource, reply_to: &Scheduler, callback: Callback) -> AsyncRequest {
		trace!(url = %resource.url, kind = %resource.kind, "resource requested");
		self.pool.invoke_with_callback(
			reply_to,
			move |fetcher| {
				let response = fetcher.fetch(&resource);
				match &response.outcome {
					Outcome::Failed(err) => debug!(url = %resource.url, %err, "fetch failed"),
					Outcome::NotModified => trace!(url = %resource.url, "resource not modified"),
					_ => trace!(url = %resource.url, "resource fetched"),
				}
				response
			},
			callback,
		)
	}
}

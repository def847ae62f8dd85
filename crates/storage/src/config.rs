// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use mooring_runtime::ThreadPriority;

/// Configuration for a [`ThreadedFileSource`](crate::ThreadedFileSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSourceConfig {
	/// Number of fetcher threads.
	///
	/// Default: 4
	pub workers: usize,

	/// Base thread name; threads are named `{thread_name}-{index}`.
	///
	/// Default: "file-source"
	pub thread_name: String,

	/// Default: [`ThreadPriority::Low`]
	pub priority: ThreadPriority,
}

impl Default for FileSourceConfig {
	fn default() -> Self {
		Self {
			workers: 4,
			thread_name: "file-source".to_string(),
			priority: ThreadPriority::Low,
		}
	}
}

impl FileSourceConfig {
	pub fn with_workers(mut self, workers: usize) -> Self {
		self.workers = workers;
		self
	}

	pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
		self.thread_name = name.into();
		self
	}

	pub fn with_priority(mut self, priority: ThreadPriority) -> Self {
		self.priority = priority;
		self
	}
}

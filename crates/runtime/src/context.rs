// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Thread naming and scheduling hints for worker threads.

use tracing::debug;
#[cfg(target_os = "linux")]
use tracing::warn;

/// Scheduling priority hint forwarded to the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadPriority {
	#[default]
	Normal,
	Low,
}

/// Nice value applied to low priority threads.
#[cfg(target_os = "linux")]
const LOW_PRIORITY_NICE: libc::c_int = 19;

impl ThreadPriority {
	/// Applies the hint to the calling thread.
	pub(crate) fn apply(self) {
		match self {
			ThreadPriority::Normal => {}
			ThreadPriority::Low => lower_current_thread(),
		}
	}
}

#[cfg(target_os = "linux")]
fn lower_current_thread() {
	// SAFETY: plain syscall without pointers. On Linux the nice value is per
	// thread and `who = 0` addresses the calling thread.
	let result = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, LOW_PRIORITY_NICE) };
	if result != 0 {
		warn!(error = %std::io::Error::last_os_error(), "failed to lower thread priority");
	} else {
		debug!("thread priority lowered");
	}
}

#[cfg(not(target_os = "linux"))]
fn lower_current_thread() {
	debug!("thread priority hints are not supported on this platform");
}

/// Configuration for a dedicated worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadContext {
	/// OS thread name, also used as the run loop name and in log fields.
	///
	/// Default: "worker"
	pub name: String,

	/// Scheduling priority hint.
	///
	/// Default: [`ThreadPriority::Normal`]
	pub priority: ThreadPriority,
}

impl Default for ThreadContext {
	fn default() -> Self {
		Self {
			name: "worker".to_string(),
			priority: ThreadPriority::Normal,
		}
	}
}

impl ThreadContext {
	/// Create a context with the given thread name and normal priority.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Set the thread name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Set the priority hint.
	pub fn with_priority(mut self, priority: ThreadPriority) -> Self {
		self.priority = priority;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let context = ThreadContext::default();
		assert_eq!(context.name, "worker");
		assert_eq!(context.priority, ThreadPriority::Normal);
	}

	#[test]
	fn test_builder() {
		let context = ThreadContext::new("tiles").with_priority(ThreadPriority::Low).with_name("glyphs");
		assert_eq!(context.name, "glyphs");
		assert_eq!(context.priority, ThreadPriority::Low);
	}

	#[test]
	fn test_apply_low_priority_on_scratch_thread() {
		std::thread::spawn(|| ThreadPriority::Low.apply()).join().unwrap();
	}
}

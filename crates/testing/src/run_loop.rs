// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use mooring_runtime::RunLoop;

/// Runs `run_loop` until something stops it or `timeout` elapses.
///
/// Returns `true` if the loop was stopped before the timeout.
pub fn run_for(run_loop: &RunLoop, timeout: Duration) -> bool {
	let timed_out = Arc::new(AtomicBool::new(false));
	let handle = run_loop.handle();

	let flag = timed_out.clone();
	let _guard = handle.clone().schedule_once(timeout, move |_| {
		flag.store(true, Ordering::SeqCst);
		handle.stop();
	});

	run_loop.run();
	!timed_out.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
	use std::time::Instant;

	use super::*;

	#[test]
	fn test_stopped_before_timeout() {
		let run_loop = RunLoop::new();
		let handle = run_loop.handle();
		let stopper = handle.clone();
		handle.post(move || stopper.stop()).unwrap();
		assert!(run_for(&run_loop, Duration::from_secs(5)));
	}

	#[test]
	fn test_times_out() {
		let run_loop = RunLoop::new();
		let start = Instant::now();
		assert!(!run_for(&run_loop, Duration::from_millis(20)));
		assert!(start.elapsed() >= Duration::from_millis(20));
	}
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering as CmpOrdering,
	time::{Duration, Instant},
};

use crate::request::RequestToken;

/// Deadline used when `now + delay` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn deadline_after(now: Instant, delay: Duration) -> Instant {
	now.checked_add(delay).or_else(|| now.checked_add(FAR_FUTURE)).unwrap_or(now)
}

pub(crate) type OnceCallback<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;
pub(crate) type RepeatCallback<S> = Box<dyn FnMut(&mut S) -> bool + Send + 'static>;

pub(crate) struct TimerEntry<S> {
	/// When the timer should fire.
	deadline: Instant,
	kind: TimerKind<S>,
	/// Gates every firing; dropping the request cancels the timer.
	token: RequestToken,
}

enum TimerKind<S> {
	/// Fire once and remove.
	Once(OnceCallback<S>),
	/// Fire repeatedly until cancelled or the callback returns false.
	Repeat {
		callback: RepeatCallback<S>,
		interval: Duration,
	},
}

impl<S> TimerEntry<S> {
	pub(crate) fn once(delay: Duration, callback: OnceCallback<S>, token: RequestToken) -> Self {
		Self {
			deadline: deadline_after(Instant::now(), delay),
			kind: TimerKind::Once(callback),
			token,
		}
	}

	pub(crate) fn repeat(interval: Duration, callback: RepeatCallback<S>, token: RequestToken) -> Self {
		Self {
			deadline: deadline_after(Instant::now(), interval),
			kind: TimerKind::Repeat {
				callback,
				interval,
			},
			token,
		}
	}

	pub(crate) fn deadline(&self) -> Instant {
		self.deadline
	}

	pub(crate) fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}

	/// Runs the timer against the loop state.
	///
	/// Returns the re-armed entry for a repeating timer that wants to continue.
	pub(crate) fn fire(self, state: &mut S, now: Instant) -> Option<Self> {
		let Self {
			kind,
			token,
			..
		} = self;

		match kind {
			TimerKind::Once(callback) => {
				token.fire(move || callback(state));
				None
			}
			TimerKind::Repeat {
				mut callback,
				interval,
			} => {
				if !token.tick(|| callback(state)) {
					return None;
				}
				Some(Self {
					deadline: deadline_after(now, interval),
					kind: TimerKind::Repeat {
						callback,
						interval,
					},
					token,
				})
			}
		}
	}
}

impl<S> Eq for TimerEntry<S> {}

impl<S> PartialEq for TimerEntry<S> {
	fn eq(&self, other: &Self) -> bool {
		self.deadline == other.deadline && self.token.id() == other.token.id()
	}
}

impl<S> Ord for TimerEntry<S> {
	// BinaryHeap is a max-heap; reversed so the earliest deadline is on top.
	fn cmp(&self, other: &Self) -> CmpOrdering {
		other.deadline.cmp(&self.deadline).then_with(|| other.token.id().cmp(&self.token.id()))
	}
}

impl<S> PartialOrd for TimerEntry<S> {
	fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
		Some(self.cmp(other))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BinaryHeap;

	use super::*;
	use crate::request::AsyncRequest;

	#[test]
	fn test_heap_orders_by_deadline() {
		let mut heap = BinaryHeap::new();
		let mut requests = Vec::new();
		for delay in [30u64, 10, 20] {
			let (request, token) = AsyncRequest::new();
			requests.push(request);
			heap.push(TimerEntry::<Vec<u64>>::once(
				Duration::from_millis(delay),
				Box::new(move |seen: &mut Vec<u64>| seen.push(delay)),
				token,
			));
		}

		let mut seen = Vec::new();
		let now = Instant::now() + Duration::from_secs(1);
		while let Some(entry) = heap.pop() {
			assert!(entry.fire(&mut seen, now).is_none());
		}
		assert_eq!(seen, vec![10, 20, 30]);
	}

	#[test]
	fn test_repeat_rearms_until_false() {
		let (_request, token) = AsyncRequest::new();
		let entry = TimerEntry::<u32>::repeat(
			Duration::from_millis(5),
			Box::new(|count: &mut u32| {
				*count += 1;
				*count < 2
			}),
			token,
		);

		let mut count = 0;
		let now = Instant::now();
		let rearmed = entry.fire(&mut count, now).expect("first tick continues");
		assert_eq!(rearmed.deadline(), now + Duration::from_millis(5));
		assert!(rearmed.fire(&mut count, now).is_none());
		assert_eq!(count, 2);
	}

	#[test]
	fn test_unbounded_delay_saturates() {
		let (_once_request, once_token) = AsyncRequest::new();
		let once = TimerEntry::<u32>::once(Duration::MAX, Box::new(|count: &mut u32| *count += 1), once_token);
		assert!(once.deadline() > Instant::now() + Duration::from_secs(365 * 24 * 60 * 60));

		let (_repeat_request, repeat_token) = AsyncRequest::new();
		let repeat = TimerEntry::<u32>::repeat(Duration::MAX, Box::new(|_: &mut u32| true), repeat_token);
		let now = Instant::now();
		let rearmed = repeat.fire(&mut 0, now).expect("repeat continues");
		assert!(rearmed.deadline() > now);
	}

	#[test]
	fn test_cancelled_timer_skips_callback() {
		let (request, token) = AsyncRequest::new();
		let entry = TimerEntry::<u32>::once(Duration::ZERO, Box::new(|count: &mut u32| *count += 1), token);
		drop(request);

		let mut count = 0;
		assert!(entry.fire(&mut count, Instant::now()).is_none());
		assert_eq!(count, 0);
	}
}

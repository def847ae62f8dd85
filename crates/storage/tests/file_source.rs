// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashSet,
	fs,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	thread,
	time::{Duration, SystemTime},
};

use mooring_runtime::RunLoop;
use mooring_storage::{
	ErrorReason, FileSource, FileSourceConfig, LocalFetcher, MemoryFetcher, MemoryStore, Outcome, Resource, Response,
	ThreadedFileSource,
};
use mooring_testing::{init_tracing, run_for, temp_dir};
use parking_lot::Mutex;

const TIMEOUT: Duration = Duration::from_secs(5);

fn memory_source(store: &MemoryStore, latency: Duration) -> ThreadedFileSource<MemoryFetcher> {
	let store = store.clone();
	ThreadedFileSource::spawn(FileSourceConfig::default().with_thread_name("memory-source"), move || {
		MemoryFetcher::new(store.clone()).with_latency(latency)
	})
	.unwrap()
}

#[test]
fn test_callback_delivered_once_on_requesting_thread() {
	init_tracing();
	let store = MemoryStore::new();
	store.insert("mem://style.json", b"{\"version\":8}".to_vec());
	let source = memory_source(&store, Duration::ZERO);

	let run_loop = RunLoop::new();
	let reply = run_loop.scheduler();
	let received = Arc::new(Mutex::new(Vec::new()));

	let received_clone = received.clone();
	let stopper = reply.clone();
	let request = source.request(
		Resource::style("mem://style.json"),
		&reply,
		Box::new(move |response| {
			received_clone.lock().push((response, thread::current().id()));
			stopper.stop();
		}),
	);

	assert!(run_for(&run_loop, TIMEOUT));
	// Give a duplicate delivery the chance to show up.
	assert!(!run_for(&run_loop, Duration::from_millis(50)));

	let received = received.lock();
	assert_eq!(received.len(), 1);
	assert_eq!(received[0].0.bytes(), Some(&b"{\"version\":8}"[..]));
	assert_eq!(received[0].1, thread::current().id());
	assert!(request.is_finished());
}

#[test]
fn test_dropped_request_on_delayed_source_never_fires() {
	init_tracing();
	let store = MemoryStore::new();
	store.insert("mem://tiles/1/0/0", b"tile".to_vec());
	let source = memory_source(&store, Duration::from_millis(100));

	let run_loop = RunLoop::new();
	let reply = run_loop.scheduler();
	let sentinel = Arc::new(AtomicBool::new(false));

	let sentinel_clone = sentinel.clone();
	let request = source.request(
		Resource::tile("mem://tiles/1/0/0"),
		&reply,
		Box::new(move |_| sentinel_clone.store(true, Ordering::SeqCst)),
	);
	drop(request);

	assert!(!run_for(&run_loop, Duration::from_millis(300)));
	assert!(!sentinel.load(Ordering::SeqCst));
}

#[test]
fn test_concurrent_requests_each_complete_once() {
	let store = MemoryStore::new();
	for i in 0..32 {
		store.insert(format!("mem://tiles/{i}"), format!("tile-{i}").into_bytes());
	}
	let source = memory_source(&store, Duration::from_millis(1));

	let run_loop = RunLoop::new();
	let reply = run_loop.scheduler();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let remaining = Arc::new(AtomicUsize::new(64));

	// Every resource is requested twice; the two replies may arrive in either order.
	let mut requests = Vec::new();
	for i in (0..32).chain(0..32) {
		let seen = seen.clone();
		let remaining = remaining.clone();
		let stopper = reply.clone();
		requests.push(source.request(
			Resource::tile(format!("mem://tiles/{i}")),
			&reply,
			Box::new(move |response| {
				seen.lock().push(response.bytes().map(<[u8]>::to_vec));
				if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
					stopper.stop();
				}
			}),
		));
	}

	assert!(run_for(&run_loop, TIMEOUT));
	let seen = seen.lock();
	assert_eq!(seen.len(), 64);
	let distinct: HashSet<_> = seen.iter().flatten().collect();
	assert_eq!(distinct.len(), 32);
}

#[test]
fn test_failures_arrive_as_responses() {
	let source = memory_source(&MemoryStore::new(), Duration::ZERO);
	let run_loop = RunLoop::new();
	let reply = run_loop.scheduler();
	let outcome = Arc::new(Mutex::new(None));

	let outcome_clone = outcome.clone();
	let stopper = reply.clone();
	let _request = source.request(
		Resource::tile("mem://missing"),
		&reply,
		Box::new(move |response: Response| {
			*outcome_clone.lock() = Some(response.outcome);
			stopper.stop();
		}),
	);

	assert!(run_for(&run_loop, TIMEOUT));
	match outcome.lock().take() {
		Some(Outcome::Failed(error)) => assert_eq!(error.reason, ErrorReason::NotFound),
		other => panic!("expected a failure, got {other:?}"),
	}
}

#[test]
fn test_local_source_round_trip() {
	temp_dir(|root| {
		fs::create_dir_all(root.join("sprites"))?;
		fs::write(root.join("sprites/sprite.json"), b"{}")?;

		let fetch_root = root.to_path_buf();
		let source = ThreadedFileSource::spawn(FileSourceConfig::default().with_workers(1), move || {
			LocalFetcher::new(fetch_root.clone())
		})
		.unwrap();

		let run_loop = RunLoop::new();
		let reply = run_loop.scheduler();
		let responses = Arc::new(Mutex::new(Vec::new()));

		let later = SystemTime::now() + Duration::from_secs(3600);
		let resources = vec![
			Resource::new(mooring_storage::ResourceKind::SpriteJson, "file://sprites/sprite.json"),
			Resource::new(mooring_storage::ResourceKind::SpriteJson, "file://sprites/sprite.json")
				.with_prior_modified(later),
			Resource::new(mooring_storage::ResourceKind::SpriteImage, "file://sprites/sprite.png"),
		];

		let mut requests = Vec::new();
		for (index, resource) in resources.into_iter().enumerate() {
			let responses = responses.clone();
			let stopper = reply.clone();
			requests.push(source.request(
				resource,
				&reply,
				Box::new(move |response| {
					let mut responses = responses.lock();
					responses.push((index, response.outcome));
					if responses.len() == 3 {
						stopper.stop();
					}
				}),
			));
		}

		assert!(run_for(&run_loop, TIMEOUT));
		let mut responses = responses.lock().clone();
		responses.sort_by_key(|(index, _)| *index);

		assert_eq!(responses[0].1, Outcome::Data(Arc::from(&b"{}"[..])));
		assert_eq!(responses[1].1, Outcome::NotModified);
		assert!(matches!(&responses[2].1, Outcome::Failed(error) if error.reason == ErrorReason::NotFound));
		Ok(())
	})
	.unwrap();
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashMap,
	sync::Arc,
	thread,
	time::{Duration, SystemTime},
};

use parking_lot::RwLock;
use xxhash_rust::xxh3::xxh3_64;

use crate::{
	resource::Resource,
	response::{ErrorReason, Response},
	source::Fetcher,
};

/// Shared in-memory resource table, keyed by URL.
///
/// Cloning is cheap and every clone sees the same entries, so a test or an
/// embedder can update resources while fetchers on other threads serve them.
#[derive(Clone, Default)]
pub struct MemoryStore(Arc<MemoryStoreInner>);

#[derive(Default)]
struct MemoryStoreInner {
	entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Clone)]
struct Entry {
	data: Arc<[u8]>,
	etag: String,
	modified: SystemTime,
	expires: Option<SystemTime>,
}

fn etag_for(data: &[u8]) -> String {
	format!("{:016x}", xxh3_64(data))
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `data` under `url`, replacing any previous entry, and returns
	/// the entity tag derived from its contents.
	pub fn insert(&self, url: impl Into<String>, data: impl Into<Arc<[u8]>>) -> String {
		self.insert_entry(url.into(), data.into(), None)
	}

	/// Like [`insert`](MemoryStore::insert), with an expiry reported to
	/// callers.
	pub fn insert_expiring(&self, url: impl Into<String>, data: impl Into<Arc<[u8]>>, expires: SystemTime) -> String {
		self.insert_entry(url.into(), data.into(), Some(expires))
	}

	fn insert_entry(&self, url: String, data: Arc<[u8]>, expires: Option<SystemTime>) -> String {
		let etag = etag_for(&data);
		self.0.entries.write().insert(
			url,
			Entry {
				data,
				etag: etag.clone(),
				modified: SystemTime::now(),
				expires,
			},
		);
		etag
	}

	pub fn remove(&self, url: &str) -> bool {
		self.0.entries.write().remove(url).is_some()
	}

	pub fn contains(&self, url: &str) -> bool {
		self.0.entries.read().contains_key(url)
	}

	pub fn len(&self) -> usize {
		self.0.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.entries.read().is_empty()
	}

	fn get(&self, url: &str) -> Option<Entry> {
		self.0.entries.read().get(url).cloned()
	}
}

/// Serves resources from a [`MemoryStore`], optionally after an artificial
/// delay.
#[derive(Clone)]
pub struct MemoryFetcher {
	store: MemoryStore,
	latency: Option<Duration>,
}

impl MemoryFetcher {
	pub fn new(store: MemoryStore) -> Self {
		Self {
			store,
			latency: None,
		}
	}

	/// Sleep for `latency` before answering each request.
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}
}

impl Fetcher for MemoryFetcher {
	fn fetch(&mut self, resource: &Resource) -> Response {
		if let Some(latency) = self.latency {
			thread::sleep(latency);
		}

		let Some(entry) = self.store.get(&resource.url) else {
			return Response::failed(ErrorReason::NotFound, format!("no entry for {}", resource.url));
		};

		let response = if resource.prior_etag.as_deref() == Some(entry.etag.as_str()) {
			Response::not_modified()
		} else if entry.data.is_empty() {
			Response::no_content()
		} else {
			Response::data(entry.data)
		};

		response.with_modified(entry.modified).with_expires(entry.expires).with_etag(entry.etag)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::response::Outcome;

	#[test]
	fn test_etag_follows_content() {
		let store = MemoryStore::new();
		let first = store.insert("mem://a", b"one".to_vec());
		let same = store.insert("mem://b", b"one".to_vec());
		let other = store.insert("mem://a", b"two".to_vec());

		assert_eq!(first, same);
		assert_ne!(first, other);
		assert_eq!(first.len(), 16);
		assert_eq!(store.len(), 2);
	}

	#[test]
	fn test_fetch_outcomes() {
		let store = MemoryStore::new();
		let etag = store.insert("mem://tile", b"payload".to_vec());
		store.insert("mem://empty", Vec::<u8>::new());
		let mut fetcher = MemoryFetcher::new(store.clone());

		let response = fetcher.fetch(&Resource::tile("mem://tile"));
		assert_eq!(response.bytes(), Some(&b"payload"[..]));
		assert_eq!(response.etag.as_deref(), Some(etag.as_str()));
		assert!(response.modified.is_some());

		let response = fetcher.fetch(&Resource::tile("mem://tile").with_prior_etag(etag));
		assert_eq!(response.outcome, Outcome::NotModified);

		let response = fetcher.fetch(&Resource::tile("mem://tile").with_prior_etag("stale"));
		assert!(response.bytes().is_some());

		assert_eq!(fetcher.fetch(&Resource::tile("mem://empty")).outcome, Outcome::NoContent);

		let response = fetcher.fetch(&Resource::tile("mem://missing"));
		assert_eq!(response.error().map(|e| e.reason), Some(ErrorReason::NotFound));
	}

	#[test]
	fn test_updates_are_visible_to_fetchers() {
		let store = MemoryStore::new();
		let mut fetcher = MemoryFetcher::new(store.clone());
		assert!(fetcher.fetch(&Resource::style("mem://style")).is_failed());

		store.insert("mem://style", b"{}".to_vec());
		assert!(!fetcher.fetch(&Resource::style("mem://style")).is_failed());

		assert!(store.remove("mem://style"));
		assert!(!store.contains("mem://style"));
		assert!(store.is_empty());
	}

	#[test]
	fn test_expiry_is_reported() {
		let store = MemoryStore::new();
		let expires = SystemTime::now() + Duration::from_secs(60);
		store.insert_expiring("mem://glyphs", b"g".to_vec(), expires);
		let response = MemoryFetcher::new(store).fetch(&Resource::new(crate::ResourceKind::Glyphs, "mem://glyphs"));
		assert_eq!(response.expires, Some(expires));
	}
}

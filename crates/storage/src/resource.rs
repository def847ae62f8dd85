// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fmt, time::SystemTime};

/// What a requested resource will be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResourceKind {
	#[default]
	Unknown,
	Style,
	Source,
	Tile,
	Glyphs,
	SpriteImage,
	SpriteJson,
}

impl fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ResourceKind::Unknown => "unknown",
			ResourceKind::Style => "style",
			ResourceKind::Source => "source",
			ResourceKind::Tile => "tile",
			ResourceKind::Glyphs => "glyphs",
			ResourceKind::SpriteImage => "sprite-image",
			ResourceKind::SpriteJson => "sprite-json",
		};
		f.write_str(name)
	}
}

/// A request for one resource, plus the validators of a copy the caller
/// already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
	pub kind: ResourceKind,
	pub url: String,
	/// Modification time of the caller's copy, if any.
	pub prior_modified: Option<SystemTime>,
	/// Entity tag of the caller's copy, if any.
	pub prior_etag: Option<String>,
}

impl Resource {
	pub fn new(kind: ResourceKind, url: impl Into<String>) -> Self {
		Self {
			kind,
			url: url.into(),
			prior_modified: None,
			prior_etag: None,
		}
	}

	pub fn style(url: impl Into<String>) -> Self {
		Self::new(ResourceKind::Style, url)
	}

	pub fn tile(url: impl Into<String>) -> Self {
		Self::new(ResourceKind::Tile, url)
	}

	pub fn with_prior_modified(mut self, modified: SystemTime) -> Self {
		self.prior_modified = Some(modified);
		self
	}

	pub fn with_prior_etag(mut self, etag: impl Into<String>) -> Self {
		self.prior_etag = Some(etag.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder() {
		let now = SystemTime::now();
		let resource = Resource::tile("mem://tiles/0/0/0").with_prior_etag("abc").with_prior_modified(now);
		assert_eq!(resource.kind, ResourceKind::Tile);
		assert_eq!(resource.url, "mem://tiles/0/0/0");
		assert_eq!(resource.prior_etag.as_deref(), Some("abc"));
		assert_eq!(resource.prior_modified, Some(now));
	}

	#[test]
	fn test_kind_display() {
		assert_eq!(ResourceKind::SpriteJson.to_string(), "sprite-json");
		assert_eq!(ResourceKind::default(), ResourceKind::Unknown);
	}
}

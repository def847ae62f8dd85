// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fs, io,
	path::{Component, Path, PathBuf},
};

use crate::{
	resource::Resource,
	response::{ErrorReason, Response},
	source::Fetcher,
};

const SCHEME: &str = "file://";

/// Serves `file://` URLs from a directory on the local file system.
///
/// The URL path is resolved relative to the root; absolute paths are treated
/// as relative and parent components are rejected.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
	root: PathBuf,
}

impl LocalFetcher {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn resolve(&self, url: &str) -> Result<PathBuf, Response> {
		let Some(relative) = url.strip_prefix(SCHEME) else {
			return Err(Response::failed(ErrorReason::Other, format!("unsupported url {url}")));
		};

		let mut path = self.root.clone();
		for component in Path::new(relative).components() {
			match component {
				Component::Normal(part) => path.push(part),
				Component::RootDir | Component::CurDir => {}
				Component::ParentDir | Component::Prefix(_) => {
					return Err(Response::failed(ErrorReason::Other, format!("path escapes root: {url}")));
				}
			}
		}
		Ok(path)
	}
}

fn io_failure(url: &str, err: io::Error) -> Response {
	let reason = match err.kind() {
		io::ErrorKind::NotFound => ErrorReason::NotFound,
		_ => ErrorReason::Other,
	};
	Response::failed(reason, format!("{url}: {err}"))
}

impl Fetcher for LocalFetcher {
	fn fetch(&mut self, resource: &Resource) -> Response {
		let path = match self.resolve(&resource.url) {
			Ok(path) => path,
			Err(response) => return response,
		};

		let metadata = match fs::metadata(&path) {
			Ok(metadata) if metadata.is_file() => metadata,
			Ok(_) => return Response::failed(ErrorReason::NotFound, format!("{} is not a file", resource.url)),
			Err(err) => return io_failure(&resource.url, err),
		};
		let modified = metadata.modified().ok();

		if let (Some(prior), Some(current)) = (resource.prior_modified, modified)
			&& prior >= current
		{
			return Response::not_modified().with_modified(current);
		}

		let response = match fs::read(&path) {
			Ok(bytes) if bytes.is_empty() => Response::no_content(),
			Ok(bytes) => Response::data(bytes),
			Err(err) => return io_failure(&resource.url, err),
		};

		match modified {
			Some(modified) => response.with_modified(modified),
			None => response,
		}
	}
}

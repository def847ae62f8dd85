// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{fmt, sync::Arc, time::SystemTime};

/// Classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorReason {
	NotFound,
	Server,
	Connection,
	Other,
}

impl fmt::Display for ErrorReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ErrorReason::NotFound => "not found",
			ErrorReason::Server => "server error",
			ErrorReason::Connection => "connection error",
			ErrorReason::Other => "error",
		};
		f.write_str(name)
	}
}

/// A failed fetch. Delivered as a value through the request callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {message}")]
pub struct ResponseError {
	pub reason: ErrorReason,
	pub message: String,
}

impl ResponseError {
	pub fn new(reason: ErrorReason, message: impl Into<String>) -> Self {
		Self {
			reason,
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	Data(Arc<[u8]>),
	/// The resource exists and is empty.
	NoContent,
	/// The caller's copy, identified by the resource's validators, is current.
	NotModified,
	Failed(ResponseError),
}

/// Result of one fetch, delivered exactly once per request that was not
/// cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub outcome: Outcome,
	pub modified: Option<SystemTime>,
	pub expires: Option<SystemTime>,
	pub etag: Option<String>,
}

impl Response {
	fn with_outcome(outcome: Outcome) -> Self {
		Self {
			outcome,
			modified: None,
			expires: None,
			etag: None,
		}
	}

	pub fn data(bytes: impl Into<Arc<[u8]>>) -> Self {
		Self::with_outcome(Outcome::Data(bytes.into()))
	}

	pub fn no_content() -> Self {
		Self::with_outcome(Outcome::NoContent)
	}

	pub fn not_modified() -> Self {
		Self::with_outcome(Outcome::NotModified)
	}

	pub fn failed(reason: ErrorReason, message: impl Into<String>) -> Self {
		Self::with_outcome(Outcome::Failed(ResponseError::new(reason, message)))
	}

	pub fn with_modified(mut self, modified: SystemTime) -> Self {
		self.modified = Some(modified);
		self
	}

	pub fn with_expires(mut self, expires: Option<SystemTime>) -> Self {
		self.expires = expires;
		self
	}

	pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
		self.etag = Some(etag.into());
		self
	}

	/// Payload bytes, if the fetch returned data.
	pub fn bytes(&self) -> Option<&[u8]> {
		match &self.outcome {
			Outcome::Data(bytes) => Some(bytes),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&ResponseError> {
		match &self.outcome {
			Outcome::Failed(error) => Some(error),
			_ => None,
		}
	}

	pub fn is_failed(&self) -> bool {
		matches!(self.outcome, Outcome::Failed(_))
	}
}

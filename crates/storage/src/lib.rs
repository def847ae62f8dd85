// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Asynchronous resource requests.
//!
//! [`FileSource`] is the contract every fetch implementation honors: the
//! callback runs once on the requesting thread, and dropping the returned
//! [`AsyncRequest`](mooring_runtime::AsyncRequest) before that suppresses it.
//! [`ThreadedFileSource`] implements it on top of blocking [`Fetcher`]s hosted
//! on worker threads.

pub use config::FileSourceConfig;
pub use fetch::{LocalFetcher, MemoryFetcher, MemoryStore};
pub use resource::{Resource, ResourceKind};
pub use response::{ErrorReason, Outcome, Response, ResponseError};
pub use source::{Callback, Fetcher, FileSource};
pub use threaded::ThreadedFileSource;

mod config;
pub mod fetch;
mod resource;
mod response;
mod source;
mod threaded;

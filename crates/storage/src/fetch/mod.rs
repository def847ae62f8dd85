// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Built-in [`Fetcher`](crate::Fetcher) implementations.

pub use local::LocalFetcher;
pub use memory::{MemoryFetcher, MemoryStore};

mod local;
mod memory;

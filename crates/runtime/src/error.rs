// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::io;

/// Errors surfaced by the runtime infrastructure.
///
/// Contract violations (a second run loop on one thread, re-entrant `run`,
/// replying to a loop owned by another thread) are not represented here; they
/// panic at the call site.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
	#[error("failed to spawn worker thread: {0}")]
	Spawn(#[from] io::Error),

	#[error("worker `{name}` failed during construction")]
	WorkerStartup {
		name: String,
	},

	#[error("run loop has been dropped")]
	LoopClosed,

	#[error("worker pool `{name}` needs at least one worker")]
	EmptyPool {
		name: String,
	},
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Thread-hosted workers driven by cooperative run loops.
//!
//! - [`RunLoop`] executes queued work on the thread that created it.
//! - [`Actor`] owns a worker object on a dedicated thread and exposes it only
//!   through asynchronous invocation.
//! - [`AsyncRequest`] is the cancellation handle for callbacks and timers:
//!   once it is dropped, its callback never runs.
//! - [`WorkerPool`] spreads invocations over several identical actors.

pub mod actor;
pub mod context;
pub mod error;
pub mod pool;
pub mod request;
pub mod run_loop;
pub mod scheduler;

pub use actor::{Actor, ActorState, ActorWatch};
pub use context::{ThreadContext, ThreadPriority};
pub use error::{Result, RuntimeError};
pub use pool::WorkerPool;
pub use request::{AsyncRequest, RequestToken};
pub use run_loop::{RunLoop, RunLoopHandle};
pub use scheduler::{Scheduler, Task};

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod logging;
pub mod run_loop;
pub mod tempdir;
pub mod util;

pub use logging::init_tracing;
pub use run_loop::run_for;
pub use tempdir::temp_dir;
pub use util::wait::{wait_for, wait_for_condition};

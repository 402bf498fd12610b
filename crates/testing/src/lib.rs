// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Test support for the troupe workspace.

mod wait;

pub use wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, wait_for, wait_for_condition};

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a tracing subscriber honoring `RUST_LOG`, once per process.
///
/// Call at the top of tests that should emit runtime logs.
pub fn init_tracing() {
	TRACING.call_once(|| {
		tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_test_writer()
			.init();
	});
}

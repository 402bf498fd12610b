// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Fixed-size worker pool over a shared FIFO task queue.
//!
//! Workers block on one mutex+condvar pair while the queue is empty; there
//! is no polling. [`WorkerPool::shutdown`] drains: it returns only after
//! every task submitted before the call has executed and every worker thread
//! has been joined.

use std::{
	collections::VecDeque,
	panic::{AssertUnwindSafe, catch_unwind},
	sync::Arc,
	thread::{self, JoinHandle},
};

use parking_lot::{Condvar, Mutex};

/// A unit of work executed on a pool worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Error returned when submitting to a pool whose shutdown has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker pool is shutting down")]
pub struct SubmitError;

struct PoolState {
	queue: VecDeque<Task>,
	shutting_down: bool,
}

struct PoolShared {
	state: Mutex<PoolState>,
	available: Condvar,
}

struct PoolInner {
	shared: Arc<PoolShared>,
	workers: Mutex<Vec<JoinHandle<()>>>,
	size: usize,
}

/// A fixed-size set of worker threads pulling tasks from a shared queue.
///
/// Cloning the pool creates another handle to the same workers. Tasks
/// submitted concurrently may execute in any order relative to each other,
/// but each task runs to completion on one worker without preemption.
#[derive(Clone)]
pub struct WorkerPool {
	inner: Arc<PoolInner>,
}

impl WorkerPool {
	/// Create a pool with `size` worker threads (at least one).
	pub fn new(size: usize) -> Self {
		let size = size.max(1);
		let shared = Arc::new(PoolShared {
			state: Mutex::new(PoolState {
				queue: VecDeque::new(),
				shutting_down: false,
			}),
			available: Condvar::new(),
		});

		let workers = (0..size)
			.map(|i| {
				let shared = shared.clone();
				thread::Builder::new()
					.name(format!("worker-{i}"))
					.spawn(move || worker_loop(shared))
					.expect("failed to spawn pool worker thread")
			})
			.collect();

		Self {
			inner: Arc::new(PoolInner {
				shared,
				workers: Mutex::new(workers),
				size,
			}),
		}
	}

	/// Number of worker threads.
	pub fn size(&self) -> usize {
		self.inner.size
	}

	/// Append a task to the queue and wake one idle worker. Never blocks.
	///
	/// Fails once [`shutdown`](Self::shutdown) has been called; the task is
	/// dropped.
	pub fn submit<F>(&self, task: F) -> Result<(), SubmitError>
	where
		F: FnOnce() + Send + 'static,
	{
		let mut state = self.inner.shared.state.lock();
		if state.shutting_down {
			return Err(SubmitError);
		}
		state.queue.push_back(Box::new(task));
		self.inner.shared.available.notify_one();
		Ok(())
	}

	/// Drain the queue and join every worker.
	///
	/// Every task submitted before this call executes to completion before
	/// shutdown returns. Idempotent; also invoked on drop of the last
	/// handle.
	pub fn shutdown(&self) {
		self.inner.begin_shutdown();

		let workers = std::mem::take(&mut *self.inner.workers.lock());
		for worker in workers {
			if worker.join().is_err() {
				tracing::error!("pool worker thread panicked");
			}
		}
		tracing::debug!(size = self.inner.size, "worker pool shut down");
	}
}

impl Default for WorkerPool {
	/// A pool sized to the number of available CPUs.
	fn default() -> Self {
		Self::new(num_cpus::get())
	}
}

impl PoolInner {
	fn begin_shutdown(&self) {
		let mut state = self.shared.state.lock();
		state.shutting_down = true;
		self.shared.available.notify_all();
	}
}

impl Drop for PoolInner {
	fn drop(&mut self) {
		self.begin_shutdown();
		for worker in std::mem::take(&mut *self.workers.lock()) {
			let _ = worker.join();
		}
	}
}

fn worker_loop(shared: Arc<PoolShared>) {
	loop {
		let task = {
			let mut state = shared.state.lock();
			loop {
				if let Some(task) = state.queue.pop_front() {
					break task;
				}
				if state.shutting_down {
					tracing::debug!("worker exiting, queue drained");
					return;
				}
				shared.available.wait(&mut state);
			}
		};

		// Lock released: the task runs to completion without blocking
		// other workers.
		if catch_unwind(AssertUnwindSafe(task)).is_err() {
			tracing::error!("pool task panicked");
		}
	}
}

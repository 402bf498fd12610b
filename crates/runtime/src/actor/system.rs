// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! The actor system: creates actors, maps their run loops onto threads, and
//! owns coordinated shutdown.
//!
//! Two scheduling policies are supported:
//!
//! - [`SchedulingPolicy::DedicatedThread`]: one named, joinable OS thread
//!   per actor. Unbounded thread count, simplest reasoning.
//! - [`SchedulingPolicy::Pooled`]: each actor's run loop is submitted as a
//!   task on a shared [`WorkerPool`]. Thread count is bounded by the pool
//!   size, so a run loop occupies a worker until the actor stops: an actor
//!   whose handler blocks (for example on
//!   [`Future::get`](crate::promise::Future::get)) starves co-scheduled
//!   actors, and two actors on a one-worker pool waiting on each other
//!   deadlock. That is the documented trade-off of the pooled policy, not a
//!   defect of the pool.
//!
//! Every spawned actor is registered through the non-generic [`ActorHandle`]
//! capability interface, which is all the system needs for broadcast stop
//! and join.

use std::{
	sync::Arc,
	thread::{self, JoinHandle},
};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::{
	actor::{
		context::Context,
		mailbox::{ActorRef, create_mailbox},
		runner::ActorRunner,
		traits::Actor,
	},
	pool::WorkerPool,
	promise::{self, Future},
};

/// Error returned when an actor's thread or pooled task did not complete
/// cleanly.
#[derive(Debug, thiserror::Error)]
#[error("actor {actor} failed to join: {reason}")]
pub struct JoinError {
	actor: String,
	reason: String,
}

impl JoinError {
	fn new(actor: &str, reason: impl Into<String>) -> Self {
		Self {
			actor: actor.to_string(),
			reason: reason.into(),
		}
	}

	/// Name of the actor that failed to join.
	pub fn actor(&self) -> &str {
		&self.actor
	}
}

/// How the system maps actor run loops onto threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
	/// One dedicated OS thread per actor.
	DedicatedThread,

	/// Actor run loops share a fixed-size worker pool.
	Pooled {
		/// Number of pool workers (at least one).
		workers: usize,
	},
}

impl Default for SchedulingPolicy {
	fn default() -> Self {
		Self::DedicatedThread
	}
}

/// Configuration for an [`ActorSystem`].
#[derive(Debug, Clone, Default)]
pub struct SystemConfig {
	scheduling: SchedulingPolicy,
}

impl SystemConfig {
	/// Create a new config with default values.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the scheduling policy.
	pub fn scheduling(mut self, scheduling: SchedulingPolicy) -> Self {
		self.scheduling = scheduling;
		self
	}
}

/// Capability interface for a running actor.
///
/// The registry stores every actor through this trait, erased over the
/// message type; scheduling details stay with the concrete handle.
pub trait ActorHandle: Send {
	/// The actor's name.
	fn name(&self) -> &str;

	/// Request the actor to stop (fence semantics, fire-and-forget).
	fn stop(&self);

	/// Whether the actor's run loop has not yet returned.
	fn is_running(&self) -> bool;

	/// Block until the run loop has returned.
	fn join(&mut self) -> Result<(), JoinError>;
}

/// Handle to an actor running on a dedicated thread.
struct ThreadActorHandle<M> {
	name: String,
	actor_ref: ActorRef<M>,
	join_handle: Option<JoinHandle<()>>,
}

impl<M: Send + 'static> ActorHandle for ThreadActorHandle<M> {
	fn name(&self) -> &str {
		&self.name
	}

	fn stop(&self) {
		self.actor_ref.stop();
	}

	fn is_running(&self) -> bool {
		self.join_handle.as_ref().is_some_and(|handle| !handle.is_finished())
	}

	fn join(&mut self) -> Result<(), JoinError> {
		match self.join_handle.take() {
			Some(handle) => handle.join().map_err(|e| JoinError::new(&self.name, format!("{:?}", e))),
			None => Ok(()),
		}
	}
}

/// Handle to an actor time-sharing a worker pool.
///
/// Completion is observed through a promise fulfilled when the run loop
/// returns; a task that never ran (or died before completing) surfaces as a
/// broken promise.
struct PooledActorHandle<M> {
	name: String,
	actor_ref: ActorRef<M>,
	done: Future<()>,
}

impl<M: Send + 'static> ActorHandle for PooledActorHandle<M> {
	fn name(&self) -> &str {
		&self.name
	}

	fn stop(&self) {
		self.actor_ref.stop();
	}

	fn is_running(&self) -> bool {
		!self.done.is_ready()
	}

	fn join(&mut self) -> Result<(), JoinError> {
		self.done.get().map_err(|_| JoinError::new(&self.name, "pooled task did not complete"))
	}
}

struct SystemInner {
	handles: Mutex<Vec<Box<dyn ActorHandle>>>,
	stopped: Mutex<bool>,
	stop_signal: Condvar,
	pool: Option<WorkerPool>,
}

/// Creates actors and maps their execution onto threads.
///
/// Cloning is cheap and shares the same registry. The registry exists only
/// to broadcast stop/join; actors built directly from
/// [`create_mailbox`](crate::actor::mailbox::create_mailbox) and
/// [`ActorRunner`] live independently of any system.
///
/// Dropping the last handle to a system stops every registered actor, then
/// drains the pool (if any). For deterministic teardown call
/// [`shutdown`](Self::shutdown) explicitly.
#[derive(Clone)]
pub struct ActorSystem {
	inner: Arc<SystemInner>,
}

impl ActorSystem {
	/// A system with the default policy (one dedicated thread per actor).
	pub fn new() -> Self {
		Self::with_config(SystemConfig::default())
	}

	/// A system with the given configuration.
	pub fn with_config(config: SystemConfig) -> Self {
		let pool = match config.scheduling {
			SchedulingPolicy::DedicatedThread => None,
			SchedulingPolicy::Pooled {
				workers,
			} => Some(WorkerPool::new(workers)),
		};

		Self {
			inner: Arc::new(SystemInner {
				handles: Mutex::new(Vec::new()),
				stopped: Mutex::new(false),
				stop_signal: Condvar::new(),
				pool,
			}),
		}
	}

	/// Spawn an actor under the system's scheduling policy.
	///
	/// The returned [`ActorRef`] is the send side of the actor's mailbox;
	/// the system keeps a joinable handle for shutdown.
	pub fn spawn<A: Actor>(&self, name: &str, actor: A) -> ActorRef<A::Message> {
		match &self.inner.pool {
			None => self.spawn_on_thread(name, actor),
			Some(pool) => self.spawn_pooled(pool, name, actor),
		}
	}

	/// Spawn an actor on a dedicated OS thread, regardless of the system
	/// policy.
	pub fn spawn_on_thread<A: Actor>(&self, name: &str, actor: A) -> ActorRef<A::Message> {
		let (actor_ref, mailbox) = create_mailbox(name);
		let ctx = Context::new(actor_ref.clone());
		let runner = ActorRunner::new(actor, mailbox, ctx);

		let thread_name = name.to_string();
		let join_handle = thread::Builder::new()
			.name(format!("actor-{name}"))
			.spawn(move || {
				debug!(actor = %thread_name, "dedicated actor thread starting");
				runner.run();
				debug!(actor = %thread_name, "dedicated actor thread stopped");
			})
			.expect("failed to spawn actor thread");

		self.register(Box::new(ThreadActorHandle {
			name: name.to_string(),
			actor_ref: actor_ref.clone(),
			join_handle: Some(join_handle),
		}));

		actor_ref
	}

	fn spawn_pooled<A: Actor>(&self, pool: &WorkerPool, name: &str, actor: A) -> ActorRef<A::Message> {
		let (actor_ref, mailbox) = create_mailbox(name);
		let ctx = Context::new(actor_ref.clone());
		let runner = ActorRunner::new(actor, mailbox, ctx);

		let (done, done_future) = promise::create();
		let task_name = name.to_string();
		let submitted = pool.submit(move || {
			debug!(actor = %task_name, "pooled actor starting");
			runner.run();
			debug!(actor = %task_name, "pooled actor stopped");
			let _ = done.fulfill(());
		});

		if submitted.is_err() {
			// The run task was dropped with its mailbox; sends to this
			// actor fail and its join reports a broken completion.
			tracing::warn!(actor = %name, "spawned after pool shutdown, actor will not run");
		}

		self.register(Box::new(PooledActorHandle {
			name: name.to_string(),
			actor_ref: actor_ref.clone(),
			done: done_future,
		}));

		actor_ref
	}

	fn register(&self, handle: Box<dyn ActorHandle>) {
		self.inner.handles.lock().push(handle);
	}

	/// Number of actors the system has spawned and not yet relinquished.
	pub fn actor_count(&self) -> usize {
		self.inner.handles.lock().len()
	}

	/// Request every registered actor to stop, then latch the stop signal.
	///
	/// Fire-and-forget: already-enqueued messages are still drained per the
	/// mailbox fence rule. Use [`shutdown`](Self::shutdown) to also wait
	/// for the drains to finish.
	pub fn stop_all(&self) {
		for handle in self.inner.handles.lock().iter() {
			handle.stop();
		}

		let mut stopped = self.inner.stopped.lock();
		*stopped = true;
		self.inner.stop_signal.notify_all();
	}

	/// Block until [`stop_all`](Self::stop_all) has been invoked.
	///
	/// This is only the "stop was requested" signal; it does not imply the
	/// actors have finished draining.
	pub fn await_stop(&self) {
		let mut stopped = self.inner.stopped.lock();
		while !*stopped {
			self.inner.stop_signal.wait(&mut stopped);
		}
	}

	/// Stop every actor, join every run loop, and drain the pool.
	///
	/// Returns the first join failure; the remaining joins still run.
	pub fn shutdown(&self) -> Result<(), JoinError> {
		self.stop_all();

		let mut handles = std::mem::take(&mut *self.inner.handles.lock());
		let mut result = Ok(());
		for handle in handles.iter_mut() {
			if let Err(err) = handle.join() {
				tracing::error!(actor = %handle.name(), error = %err, "actor did not join cleanly");
				if result.is_ok() {
					result = Err(err);
				}
			}
		}

		if let Some(pool) = &self.inner.pool {
			pool.shutdown();
		}

		debug!("actor system shut down");
		result
	}
}

impl Default for ActorSystem {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for SystemInner {
	fn drop(&mut self) {
		// Fence every remaining actor so the pool's own drop can drain
		// without waiting on run loops that would never exit.
		for handle in self.handles.lock().iter() {
			handle.stop();
		}
	}
}

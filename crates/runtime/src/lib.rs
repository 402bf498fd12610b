// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! troupe-runtime: a minimal thread-based actor runtime.
//!
//! Three building blocks, each blocking on its own mutex+condvar pair and
//! nothing else:
//!
//! - [`promise`]: a single-assignment value channel. One [`Promise`] writer,
//!   any number of [`Future`] readers; every reader observes the same value.
//! - [`actor`]: typed mailboxes drained by a per-actor run loop, with a
//!   deterministic stop fence, a fault hook for panicking handlers, and an
//!   [`ActorSystem`] that schedules actors on dedicated threads or a shared
//!   worker pool and owns coordinated shutdown.
//! - [`pool`]: a fixed-size [`WorkerPool`] over a shared FIFO task queue
//!   with graceful-drain shutdown.

pub mod actor;
pub mod pool;
pub mod promise;

pub use actor::{
	Actor, ActorRef, ActorRunner, ActorSystem, Context, Flow, HandlerFault, SchedulingPolicy, SystemConfig,
};
pub use pool::WorkerPool;
pub use promise::{ChannelError, Future, Promise};

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Actor execution context.
//!
//! The context gives a handler access to its own [`ActorRef`] (for replies
//! and self-sends) and timer scheduling.

use std::{any::Any, time::Duration};

use crate::actor::{
	mailbox::ActorRef,
	timers::{self, TimerHandle},
};

/// Report of a panic caught at the run-loop boundary.
///
/// Handed to [`Actor::on_fault`](crate::actor::Actor::on_fault). The fault is
/// local to the offending message: the run loop and the rest of the queue
/// are unaffected.
#[derive(Debug, Clone)]
pub struct HandlerFault {
	/// Name of the actor whose handler panicked.
	pub actor: String,
	/// Rendered panic payload.
	pub message: String,
}

impl HandlerFault {
	pub(crate) fn new(actor: &str, payload: Box<dyn Any + Send>) -> Self {
		let message = if let Some(msg) = payload.downcast_ref::<&str>() {
			(*msg).to_string()
		} else if let Some(msg) = payload.downcast_ref::<String>() {
			msg.clone()
		} else {
			"non-string panic payload".to_string()
		};
		Self {
			actor: actor.to_string(),
			message,
		}
	}
}

impl std::fmt::Display for HandlerFault {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "handler fault in actor {}: {}", self.actor, self.message)
	}
}

/// Context provided to actors during execution.
pub struct Context<M> {
	self_ref: ActorRef<M>,
}

impl<M: Send + 'static> Context<M> {
	/// Create a context for an actor whose mailbox was built directly with
	/// [`create_mailbox`](crate::actor::mailbox::create_mailbox), outside
	/// an [`ActorSystem`](crate::actor::system::ActorSystem).
	pub fn new(self_ref: ActorRef<M>) -> Self {
		Self {
			self_ref,
		}
	}

	/// Get a reference to send messages to self.
	pub fn self_ref(&self) -> ActorRef<M> {
		self.self_ref.clone()
	}

	/// The actor's name.
	pub fn name(&self) -> &str {
		self.self_ref.name()
	}

	/// Schedule a message to be sent to this actor after a delay.
	///
	/// Returns a handle that can be used to cancel the timer.
	pub fn schedule_once(&self, delay: Duration, msg: M) -> TimerHandle {
		timers::schedule_once(self.self_ref.clone(), delay, msg)
	}
}

impl<M: Send + Clone + 'static> Context<M> {
	/// Schedule a message to be sent to this actor repeatedly at an
	/// interval.
	///
	/// The timer runs until cancelled or until the actor is dead.
	/// Returns a handle that can be used to cancel the timer.
	pub fn schedule_repeat(&self, interval: Duration, msg: M) -> TimerHandle {
		timers::schedule_repeat(self.self_ref.clone(), interval, msg)
	}
}

impl<M> Clone for Context<M> {
	fn clone(&self) -> Self {
		Self {
			self_ref: self.self_ref.clone(),
		}
	}
}

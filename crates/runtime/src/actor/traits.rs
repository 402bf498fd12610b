// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Core actor trait and associated types.

use crate::actor::context::{Context, HandlerFault};

/// What the actor wants to do after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	/// Keep processing messages.
	Continue,

	/// Stop this actor permanently.
	///
	/// The run loop exits without draining the mailbox; the actor's
	/// `post_stop` hook is called and queued messages are dropped.
	Stop,
}

/// The core actor abstraction.
///
/// Actors are isolated units of computation that:
/// - Own their state exclusively (no shared mutable state)
/// - Process messages one at a time, in mailbox arrival order
/// - Communicate with other actors only via message passing
///
/// # Lifecycle
///
/// 1. `init()` - Create initial state
/// 2. `pre_start()` - Called before processing begins
/// 3. Loop: `receive()` each delivered message
/// 4. `post_stop()` - Cleanup after the run loop exits
///
/// State is owned by the run loop and mutated only by `receive`; no other
/// thread may touch it.
///
/// # Example
///
/// ```ignore
/// struct Counter;
///
/// enum CounterMsg {
///     Increment,
///     Get { reply: Promise<i64> },
/// }
///
/// impl Actor for Counter {
///     type State = i64;
///     type Message = CounterMsg;
///
///     fn init(&self, _ctx: &Context<Self::Message>) -> Self::State {
///         0
///     }
///
///     fn receive(
///         &self,
///         state: &mut Self::State,
///         msg: Self::Message,
///         _ctx: &Context<Self::Message>,
///     ) -> Flow {
///         match msg {
///             CounterMsg::Increment => *state += 1,
///             CounterMsg::Get { reply } => { let _ = reply.fulfill(*state); }
///         }
///         Flow::Continue
///     }
/// }
/// ```
pub trait Actor: Send + 'static {
	/// The actor's internal state (owned, not shared).
	type State: 'static;

	/// Messages this actor can receive.
	type Message: Send + 'static;

	/// Create initial state. Called once before the run loop starts.
	fn init(&self, ctx: &Context<Self::Message>) -> Self::State;

	/// Handle a single message. This is the core of the actor.
	///
	/// Runs with the mailbox lock released, so the handler may send to any
	/// actor, including itself. Return [`Flow::Stop`] to terminate the
	/// actor from inside a handler.
	fn receive(&self, state: &mut Self::State, msg: Self::Message, ctx: &Context<Self::Message>) -> Flow;

	/// Called once before message processing begins.
	#[allow(unused_variables)]
	fn pre_start(&self, state: &mut Self::State, ctx: &Context<Self::Message>) {}

	/// Called once after the run loop exits (also when a handler stopped
	/// the actor via [`Flow::Stop`]).
	#[allow(unused_variables)]
	fn post_stop(&self, state: &mut Self::State) {}

	/// Called when `receive` panicked.
	///
	/// The panic is caught at the run-loop boundary; the loop and the
	/// remaining queued messages survive. The default implementation logs
	/// the fault.
	#[allow(unused_variables)]
	fn on_fault(&self, state: &mut Self::State, fault: HandlerFault) {
		tracing::error!(actor = %fault.actor, fault = %fault.message, "message handler panicked");
	}
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Actor runner.
//!
//! Drives an actor's message loop on whatever thread it is handed to:
//! a dedicated OS thread or a worker-pool task, the scheduler decides.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::actor::{
	context::{Context, HandlerFault},
	mailbox::Mailbox,
	traits::{Actor, Flow},
};

/// Drives an actor's execution to completion.
///
/// The run loop:
/// 1. Initializes actor state
/// 2. Calls the `pre_start` hook
/// 3. Delivers messages one at a time until the stop fence is exhausted or
///    a handler returns [`Flow::Stop`]
/// 4. Closes the mailbox and calls the `post_stop` hook
///
/// A panic inside `receive` is caught here and reported through the actor's
/// `on_fault` hook; the loop and the remaining queue survive.
pub struct ActorRunner<A: Actor> {
	actor: A,
	mailbox: Mailbox<A::Message>,
	ctx: Context<A::Message>,
}

impl<A: Actor> ActorRunner<A> {
	/// Create a new actor runner.
	pub fn new(actor: A, mailbox: Mailbox<A::Message>, ctx: Context<A::Message>) -> Self {
		Self {
			actor,
			mailbox,
			ctx,
		}
	}

	/// Run the actor to completion.
	pub fn run(self) {
		let mut state = self.actor.init(&self.ctx);

		self.actor.pre_start(&mut state, &self.ctx);

		self.run_loop(&mut state);

		// Reject senders before the final hook runs.
		self.mailbox.close();

		self.actor.post_stop(&mut state);
	}

	fn run_loop(&self, state: &mut A::State) {
		while let Some(msg) = self.mailbox.recv() {
			// The mailbox lock is released here; handlers may send
			// freely, including to this actor.
			let outcome = catch_unwind(AssertUnwindSafe(|| self.actor.receive(state, msg, &self.ctx)));

			match outcome {
				Ok(Flow::Continue) => {}
				Ok(Flow::Stop) => {
					tracing::debug!(actor = %self.ctx.name(), "handler returned Flow::Stop");
					return;
				}
				Err(payload) => {
					let fault = HandlerFault::new(self.ctx.name(), payload);
					self.actor.on_fault(state, fault);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	};

	use super::*;
	use crate::actor::mailbox::create_mailbox;

	struct Recorder {
		faults: Arc<AtomicUsize>,
	}

	enum RecorderMsg {
		Add(u64),
		Panic,
		Quit,
	}

	impl Actor for Recorder {
		type Message = RecorderMsg;
		type State = u64;

		fn init(&self, _ctx: &Context<Self::Message>) -> Self::State {
			0
		}

		fn receive(&self, state: &mut Self::State, msg: Self::Message, _ctx: &Context<Self::Message>) -> Flow {
			match msg {
				RecorderMsg::Add(n) => {
					*state += n;
					Flow::Continue
				}
				RecorderMsg::Panic => panic!("boom"),
				RecorderMsg::Quit => Flow::Stop,
			}
		}

		fn post_stop(&self, state: &mut Self::State) {
			// Smoke-check that the final state is visible to the hook.
			assert!(*state < u64::MAX);
		}

		fn on_fault(&self, _state: &mut Self::State, _fault: HandlerFault) {
			self.faults.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[test]
	fn test_drains_then_exits_on_stop() {
		let (actor_ref, mailbox) = create_mailbox("recorder");
		let ctx = Context::new(actor_ref.clone());
		let faults = Arc::new(AtomicUsize::new(0));
		let runner = ActorRunner::new(
			Recorder {
				faults,
			},
			mailbox,
			ctx,
		);

		for n in [1, 2, 3] {
			actor_ref.send(RecorderMsg::Add(n)).unwrap();
		}
		actor_ref.stop();

		// Runs on this thread; returns once the fence is exhausted.
		runner.run();
		assert!(!actor_ref.is_connected());
		assert!(actor_ref.send(RecorderMsg::Add(4)).is_err());
	}

	#[test]
	fn test_panic_reported_and_loop_survives() {
		let (actor_ref, mailbox) = create_mailbox("faulty");
		let ctx = Context::new(actor_ref.clone());
		let faults = Arc::new(AtomicUsize::new(0));
		let runner = ActorRunner::new(
			Recorder {
				faults: faults.clone(),
			},
			mailbox,
			ctx,
		);

		actor_ref.send(RecorderMsg::Panic).unwrap();
		actor_ref.send(RecorderMsg::Add(1)).unwrap();
		actor_ref.stop();

		runner.run();
		assert_eq!(faults.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_flow_stop_skips_queue() {
		let (actor_ref, mailbox) = create_mailbox("quitter");
		let ctx = Context::new(actor_ref.clone());
		let faults = Arc::new(AtomicUsize::new(0));
		let runner = ActorRunner::new(
			Recorder {
				faults,
			},
			mailbox,
			ctx,
		);

		actor_ref.send(RecorderMsg::Quit).unwrap();
		actor_ref.send(RecorderMsg::Add(1)).unwrap();

		runner.run();
		assert!(!actor_ref.is_connected());
	}
}

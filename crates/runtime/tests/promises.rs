// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Promise/future semantics under real thread interleavings.

use std::{thread, time::Duration};

use troupe_runtime::{
	Actor, ActorSystem, ChannelError, Context, Flow,
	promise::{self, Promise},
};

enum ComputeMsg {
	Compute {
		reply: Promise<i64>,
	},
}

/// Fulfills each request with a fixed answer.
struct Oracle;

impl Actor for Oracle {
	type Message = ComputeMsg;
	type State = ();

	fn init(&self, _ctx: &Context<Self::Message>) -> Self::State {}

	fn receive(&self, _state: &mut Self::State, msg: Self::Message, _ctx: &Context<Self::Message>) -> Flow {
		let ComputeMsg::Compute {
			reply,
		} = msg;
		let _ = reply.fulfill(42);
		Flow::Continue
	}
}

#[test]
fn test_two_futures_observe_the_handler_result() {
	let system = ActorSystem::new();
	let actor_ref = system.spawn("oracle", Oracle);

	let future = actor_ref.ask(|reply| ComputeMsg::Compute {
		reply,
	});
	let second = future.clone();

	assert_eq!(future.get(), Ok(42));
	assert_eq!(second.get(), Ok(42));

	system.shutdown().unwrap();
}

#[test]
fn test_concurrent_getters_see_one_value() {
	let (promise, future) = promise::create::<String>();

	// Readers blocked before fulfillment.
	let early: Vec<_> = (0..4)
		.map(|_| {
			let future = future.clone();
			thread::spawn(move || future.get())
		})
		.collect();

	thread::sleep(Duration::from_millis(20));
	promise.fulfill("answer".to_string()).unwrap();

	for handle in early {
		assert_eq!(handle.join().unwrap().unwrap(), "answer");
	}

	// Readers subscribing after fulfillment.
	assert_eq!(future.clone().get().unwrap(), "answer");
	assert_eq!(future.get().unwrap(), "answer");
}

#[test]
fn test_ask_to_dead_actor_reports_broken() {
	let system = ActorSystem::new();
	let actor_ref = system.spawn("doomed", Oracle);

	actor_ref.stop();
	troupe_testing::wait_for(|| !actor_ref.is_connected(), "actor should exit");

	// The message is rejected, the embedded promise is dropped, and the
	// future unblocks with a broken-channel outcome instead of hanging.
	let future = actor_ref.ask(|reply| ComputeMsg::Compute {
		reply,
	});
	assert_eq!(future.get(), Err(ChannelError::Broken));

	system.shutdown().unwrap();
}

enum SilentMsg {
	Ignore {
		#[allow(dead_code)]
		reply: Promise<i64>,
	},
}

/// Drops each request without replying.
struct Silent;

impl Actor for Silent {
	type Message = SilentMsg;
	type State = ();

	fn init(&self, _ctx: &Context<Self::Message>) -> Self::State {}

	fn receive(&self, _state: &mut Self::State, msg: Self::Message, _ctx: &Context<Self::Message>) -> Flow {
		let SilentMsg::Ignore {
			reply: _,
		} = msg;
		Flow::Continue
	}
}

#[test]
fn test_handler_that_never_fulfills_breaks_the_future() {
	let system = ActorSystem::new();
	let actor_ref = system.spawn("silent", Silent);

	let future = actor_ref.ask(|reply| SilentMsg::Ignore {
		reply,
	});

	// The handler drops the promise unfulfilled; waiters must not hang.
	assert_eq!(future.get(), Err(ChannelError::Broken));

	system.shutdown().unwrap();
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Timer utilities for actors.
//!
//! Schedules messages to be delivered to an actor after a delay
//! ([`schedule_once`]) or at a fixed interval ([`schedule_repeat`]). Each
//! timer runs on its own named thread and honors a shared cancellation flag;
//! a repeating timer stops on its own once the target actor is dead.

use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU64, Ordering},
	},
	thread,
	time::Duration,
};

use crate::actor::mailbox::ActorRef;

/// Handle to a scheduled timer.
///
/// Can be used to cancel the timer before it fires.
#[derive(Clone)]
pub struct TimerHandle {
	id: u64,
	cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
	fn new(id: u64) -> Self {
		Self {
			id,
			cancelled: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Cancel this timer.
	///
	/// Returns `true` if this call was the one that cancelled it.
	pub fn cancel(&self) -> bool {
		self.cancelled
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_ok()
	}

	/// Check if this timer has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}

	/// Get the timer ID.
	pub fn id(&self) -> u64 {
		self.id
	}

	fn cancelled_flag(&self) -> Arc<AtomicBool> {
		self.cancelled.clone()
	}
}

impl std::fmt::Debug for TimerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TimerHandle")
			.field("id", &self.id)
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}

/// Counter for generating unique timer IDs.
static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

fn next_timer_id() -> u64 {
	NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Schedule a message to be sent after a delay.
///
/// Returns a handle that can be used to cancel the timer.
pub fn schedule_once<M: Send + 'static>(actor_ref: ActorRef<M>, delay: Duration, msg: M) -> TimerHandle {
	let handle = TimerHandle::new(next_timer_id());
	let cancelled = handle.cancelled_flag();

	spawn_timer_thread(handle.id(), move || {
		thread::sleep(delay);

		if !cancelled.load(Ordering::SeqCst) {
			let _ = actor_ref.send(msg);
		}
	});

	handle
}

/// Schedule a message to be sent repeatedly at an interval.
///
/// Returns a handle that can be used to cancel the timer.
pub fn schedule_repeat<M: Send + Clone + 'static>(
	actor_ref: ActorRef<M>,
	interval: Duration,
	msg: M,
) -> TimerHandle {
	let handle = TimerHandle::new(next_timer_id());
	let cancelled = handle.cancelled_flag();

	spawn_timer_thread(handle.id(), move || {
		loop {
			thread::sleep(interval);

			if cancelled.load(Ordering::SeqCst) {
				break;
			}

			if actor_ref.send(msg.clone()).is_err() {
				// Actor is dead, stop the timer.
				tracing::debug!(actor = %actor_ref.name(), "repeat timer target is dead, stopping");
				break;
			}
		}
	});

	handle
}

fn spawn_timer_thread<F: FnOnce() + Send + 'static>(id: u64, body: F) {
	thread::Builder::new()
		.name(format!("timer-{id}"))
		.spawn(body)
		.expect("failed to spawn timer thread");
}

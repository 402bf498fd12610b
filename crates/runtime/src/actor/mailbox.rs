// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Actor mailbox: an unbounded FIFO queue with a deterministic stop fence.
//!
//! [`ActorRef`] is the cloneable send side handed to producers; [`Mailbox`]
//! is the receive side owned by the actor's run loop. `stop()` snapshots the
//! enqueue counter as a fence: exactly the messages enqueued before the fence
//! are delivered, everything after it is dropped when the mailbox closes, and
//! sends to a closed mailbox fail fast with the message returned.

use std::{collections::VecDeque, fmt, sync::Arc};

use parking_lot::{Condvar, Mutex};

use crate::promise::{self, Future, Promise};

/// Error returned when sending to a mailbox whose run loop has exited.
///
/// Carries the undelivered message. Fire-and-forget callers ignore it:
/// `let _ = actor_ref.send(msg);`
#[derive(thiserror::Error)]
#[error("sending on a closed mailbox")]
pub struct SendError<M>(pub M);

impl<M> SendError<M> {
	/// Recover the message that could not be delivered.
	pub fn into_inner(self) -> M {
		self.0
	}
}

impl<M> fmt::Debug for SendError<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SendError(..)")
	}
}

struct MailboxState<M> {
	queue: VecDeque<M>,
	/// Messages appended so far; never decreases.
	enqueued: u64,
	/// Messages handed to the run loop so far.
	delivered: u64,
	/// Set once by `stop()`: only messages enqueued before this count are
	/// delivered.
	fence: Option<u64>,
	/// Set when the run loop has exited; sends fail from here on.
	closed: bool,
}

struct Shared<M> {
	state: Mutex<MailboxState<M>>,
	available: Condvar,
	name: Arc<str>,
}

/// Create a linked sender/receiver pair for one actor.
pub fn create_mailbox<M>(name: &str) -> (ActorRef<M>, Mailbox<M>) {
	let shared = Arc::new(Shared {
		state: Mutex::new(MailboxState {
			queue: VecDeque::new(),
			enqueued: 0,
			delivered: 0,
			fence: None,
			closed: false,
		}),
		available: Condvar::new(),
		name: Arc::from(name),
	});

	(
		ActorRef {
			shared: shared.clone(),
		},
		Mailbox {
			shared,
		},
	)
}

/// Cloneable handle for sending messages to an actor.
pub struct ActorRef<M> {
	shared: Arc<Shared<M>>,
}

impl<M> Clone for ActorRef<M> {
	fn clone(&self) -> Self {
		Self {
			shared: self.shared.clone(),
		}
	}
}

impl<M> ActorRef<M> {
	/// The actor's name, as given at spawn time.
	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Append a message to the mailbox. Never blocks.
	///
	/// Fails once the run loop has exited, returning the message.
	pub fn send(&self, msg: M) -> Result<(), SendError<M>> {
		let mut state = self.shared.state.lock();
		if state.closed {
			return Err(SendError(msg));
		}
		state.queue.push_back(msg);
		state.enqueued += 1;
		self.shared.available.notify_one();
		Ok(())
	}

	/// Request the actor to stop. Idempotent, fire-and-forget.
	///
	/// Snapshots the enqueue counter as the delivery fence: every message
	/// enqueued before this call is still delivered, anything enqueued
	/// after it is dropped when the run loop exits.
	pub fn stop(&self) {
		let mut state = self.shared.state.lock();
		if state.fence.is_none() {
			state.fence = Some(state.enqueued);
			self.shared.available.notify_one();
		}
	}

	/// Whether the run loop is still accepting messages.
	pub fn is_connected(&self) -> bool {
		!self.shared.state.lock().closed
	}

	/// Send a request whose reply arrives through a [`Future`].
	///
	/// The closure embeds the [`Promise`] in the message; the handler
	/// fulfills it. If the actor is dead or the handler never fulfills,
	/// the promise is dropped and the future reports
	/// [`ChannelError::Broken`](crate::promise::ChannelError::Broken)
	/// instead of hanging.
	pub fn ask<R, F>(&self, make_msg: F) -> Future<R>
	where
		F: FnOnce(Promise<R>) -> M,
	{
		let (reply, future) = promise::create();
		let _ = self.send(make_msg(reply));
		future
	}
}

impl<M> fmt::Debug for ActorRef<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActorRef").field("name", &self.name()).finish()
	}
}

/// Receive side of a mailbox. Owned by exactly one run loop.
pub struct Mailbox<M> {
	shared: Arc<Shared<M>>,
}

impl<M> Mailbox<M> {
	/// Block until a deliverable message is available, or return `None`
	/// once the fence is exhausted.
	///
	/// Returning `None` closes the mailbox: queued post-fence messages are
	/// dropped and subsequent sends fail.
	pub fn recv(&self) -> Option<M> {
		let mut state = self.shared.state.lock();
		loop {
			if state.closed {
				return None;
			}
			if let Some(fence) = state.fence {
				if state.delivered >= fence {
					Self::close_locked(&mut state, &self.shared.name);
					return None;
				}
				// fence <= enqueued, so a pre-fence message is queued.
				let msg = state.queue.pop_front().expect("pre-fence message missing");
				state.delivered += 1;
				return Some(msg);
			}
			if let Some(msg) = state.queue.pop_front() {
				state.delivered += 1;
				return Some(msg);
			}
			self.shared.available.wait(&mut state);
		}
	}

	/// Close the mailbox without draining. Used when a handler returns
	/// [`Flow::Stop`](crate::actor::Flow::Stop). Idempotent.
	pub fn close(&self) {
		let mut state = self.shared.state.lock();
		if !state.closed {
			Self::close_locked(&mut state, &self.shared.name);
		}
	}

	fn close_locked(state: &mut MailboxState<M>, name: &str) {
		state.closed = true;
		let dropped = state.queue.len();
		state.queue.clear();
		if dropped > 0 {
			tracing::debug!(actor = %name, dropped, "mailbox closed with undelivered messages");
		}
	}
}

impl<M> Drop for Mailbox<M> {
	fn drop(&mut self) {
		// A mailbox that loses its run loop must start rejecting senders.
		self.close();
	}
}

#[cfg(test)]
mod tests {
	use std::{thread, time::Duration};

	use super::*;

	#[test]
	fn test_send_recv_fifo() {
		let (actor_ref, mailbox) = create_mailbox("fifo");
		for i in 0..10 {
			actor_ref.send(i).unwrap();
		}
		for i in 0..10 {
			assert_eq!(mailbox.recv(), Some(i));
		}
	}

	#[test]
	fn test_recv_blocks_until_send() {
		let (actor_ref, mailbox) = create_mailbox("blocking");

		let handle = thread::spawn(move || mailbox.recv());

		thread::sleep(Duration::from_millis(20));
		actor_ref.send(99u32).unwrap();

		assert_eq!(handle.join().unwrap(), Some(99));
	}

	#[test]
	fn test_stop_drains_enqueued_messages() {
		let (actor_ref, mailbox) = create_mailbox("drain");
		for i in 0..5 {
			actor_ref.send(i).unwrap();
		}
		actor_ref.stop();

		for i in 0..5 {
			assert_eq!(mailbox.recv(), Some(i));
		}
		assert_eq!(mailbox.recv(), None);
	}

	#[test]
	fn test_stop_wakes_empty_recv() {
		let (actor_ref, mailbox) = create_mailbox::<u32>("empty-stop");

		let handle = thread::spawn(move || mailbox.recv());

		thread::sleep(Duration::from_millis(20));
		actor_ref.stop();

		assert_eq!(handle.join().unwrap(), None);
	}

	#[test]
	fn test_messages_after_fence_are_dropped() {
		let (actor_ref, mailbox) = create_mailbox("fence");
		actor_ref.send(1).unwrap();
		actor_ref.stop();
		// Enqueued after the fence: accepted but never delivered.
		actor_ref.send(2).unwrap();

		assert_eq!(mailbox.recv(), Some(1));
		assert_eq!(mailbox.recv(), None);
		assert!(!actor_ref.is_connected());
	}

	#[test]
	fn test_send_after_close_fails() {
		let (actor_ref, mailbox) = create_mailbox("dead");
		actor_ref.stop();
		assert_eq!(mailbox.recv(), None);

		let err = actor_ref.send(7).unwrap_err();
		assert_eq!(err.into_inner(), 7);
	}

	#[test]
	fn test_stop_is_idempotent() {
		let (actor_ref, mailbox) = create_mailbox("idempotent");
		actor_ref.send(1).unwrap();
		actor_ref.stop();
		actor_ref.stop();
		// The fence is fixed by the first stop.
		actor_ref.send(2).unwrap();
		actor_ref.stop();

		assert_eq!(mailbox.recv(), Some(1));
		assert_eq!(mailbox.recv(), None);
	}

	#[test]
	fn test_close_drops_queue() {
		let (actor_ref, mailbox) = create_mailbox("close");
		actor_ref.send(1).unwrap();
		mailbox.close();

		assert_eq!(mailbox.recv(), None);
		assert!(actor_ref.send(2).is_err());
	}
}

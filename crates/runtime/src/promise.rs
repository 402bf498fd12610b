// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Single-assignment value channel.
//!
//! A [`Promise`] is the unique write side of a shared cell; any number of
//! [`Future`]s read from it. The cell transitions `Pending -> Fulfilled`
//! exactly once, or `Pending -> Broken` if the promise is dropped without a
//! value. Readers block on [`Future::get`] and all observe the same value:
//! the stored value is cloned out under the cell lock, never moved.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Errors reported by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
	/// A value was already set on this channel.
	#[error("channel already fulfilled")]
	AlreadyFulfilled,

	/// The promise was dropped before a value was set.
	#[error("promise dropped before fulfillment")]
	Broken,
}

enum State<T> {
	Pending,
	Fulfilled(T),
	Broken,
}

struct Cell<T> {
	state: Mutex<State<T>>,
	fulfilled: Condvar,
}

impl<T> Cell<T> {
	fn new() -> Self {
		Self {
			state: Mutex::new(State::Pending),
			fulfilled: Condvar::new(),
		}
	}
}

/// Create a linked promise/future pair in the pending state.
///
/// Additional readers are created by cloning the returned [`Future`],
/// before or after fulfillment.
pub fn create<T>() -> (Promise<T>, Future<T>) {
	let cell = Arc::new(Cell::new());
	(
		Promise {
			cell: cell.clone(),
		},
		Future {
			cell,
		},
	)
}

/// The write side of the channel.
///
/// Not cloneable: there is exactly one writer per cell. Dropping an
/// unfulfilled promise breaks the channel and wakes every waiter.
pub struct Promise<T> {
	cell: Arc<Cell<T>>,
}

impl<T> Promise<T> {
	/// Store the value and wake every current and future reader.
	///
	/// Fails with [`ChannelError::AlreadyFulfilled`] if a value was already
	/// set; the original value is left untouched.
	pub fn fulfill(&self, value: T) -> Result<(), ChannelError> {
		let mut state = self.cell.state.lock();
		match *state {
			State::Pending => {
				*state = State::Fulfilled(value);
				self.cell.fulfilled.notify_all();
				Ok(())
			}
			State::Fulfilled(_) => Err(ChannelError::AlreadyFulfilled),
			// Only drop sets Broken, and there is a single writer.
			State::Broken => Err(ChannelError::Broken),
		}
	}

	/// Whether a value has been set.
	pub fn is_fulfilled(&self) -> bool {
		matches!(*self.cell.state.lock(), State::Fulfilled(_))
	}

	/// Create a reader for this cell.
	pub fn future(&self) -> Future<T> {
		Future {
			cell: self.cell.clone(),
		}
	}
}

impl<T> Drop for Promise<T> {
	fn drop(&mut self) {
		let mut state = self.cell.state.lock();
		if matches!(*state, State::Pending) {
			*state = State::Broken;
			self.cell.fulfilled.notify_all();
		}
	}
}

/// A read side of the channel.
///
/// Cloning subscribes another reader to the same cell.
pub struct Future<T> {
	cell: Arc<Cell<T>>,
}

impl<T> Clone for Future<T> {
	fn clone(&self) -> Self {
		Self {
			cell: self.cell.clone(),
		}
	}
}

impl<T: Clone> Future<T> {
	/// Block until the cell leaves the pending state, then return the value.
	///
	/// Every reader receives a clone of the stored value; reading never
	/// consumes it. Returns [`ChannelError::Broken`] if the promise was
	/// dropped unfulfilled.
	pub fn get(&self) -> Result<T, ChannelError> {
		let mut state = self.cell.state.lock();
		loop {
			match &*state {
				State::Fulfilled(value) => return Ok(value.clone()),
				State::Broken => return Err(ChannelError::Broken),
				State::Pending => {}
			}
			self.cell.fulfilled.wait(&mut state);
		}
	}

	/// Non-blocking probe. `None` while the cell is still pending.
	pub fn try_get(&self) -> Option<Result<T, ChannelError>> {
		match &*self.cell.state.lock() {
			State::Fulfilled(value) => Some(Ok(value.clone())),
			State::Broken => Some(Err(ChannelError::Broken)),
			State::Pending => None,
		}
	}
}

impl<T> Future<T> {
	/// Whether the cell has left the pending state.
	pub fn is_ready(&self) -> bool {
		!matches!(*self.cell.state.lock(), State::Pending)
	}
}

#[cfg(test)]
mod tests {
	use std::{thread, time::Duration};

	use super::*;

	#[test]
	fn test_fulfill_then_get() {
		let (promise, future) = create();
		promise.fulfill(7).unwrap();
		assert_eq!(future.get(), Ok(7));
	}

	#[test]
	fn test_get_blocks_until_fulfilled() {
		let (promise, future) = create();

		let handle = thread::spawn(move || future.get());

		thread::sleep(Duration::from_millis(20));
		promise.fulfill(42).unwrap();

		assert_eq!(handle.join().unwrap(), Ok(42));
	}

	#[test]
	fn test_fanout_readers_share_one_value() {
		let (promise, future) = create::<String>();
		let second = future.clone();

		promise.fulfill("shared".to_string()).unwrap();

		// Reading must not consume the stored value.
		assert_eq!(future.get().unwrap(), "shared");
		assert_eq!(second.get().unwrap(), "shared");
		assert_eq!(future.get().unwrap(), "shared");
	}

	#[test]
	fn test_subscribe_after_fulfill() {
		let (promise, future) = create();
		promise.fulfill(1).unwrap();

		let late = future.clone();
		assert_eq!(late.get(), Ok(1));
		assert_eq!(promise.future().get(), Ok(1));
	}

	#[test]
	fn test_second_fulfill_fails_and_keeps_value() {
		let (promise, future) = create();
		promise.fulfill(1).unwrap();

		assert_eq!(promise.fulfill(2), Err(ChannelError::AlreadyFulfilled));
		assert_eq!(future.get(), Ok(1));
	}

	#[test]
	fn test_drop_promise_breaks_channel() {
		let (promise, future) = create::<u32>();
		drop(promise);

		assert_eq!(future.get(), Err(ChannelError::Broken));
		// Later subscribers observe the same outcome.
		assert_eq!(future.clone().get(), Err(ChannelError::Broken));
	}

	#[test]
	fn test_drop_promise_wakes_blocked_reader() {
		let (promise, future) = create::<u32>();

		let handle = thread::spawn(move || future.get());

		thread::sleep(Duration::from_millis(20));
		drop(promise);

		assert_eq!(handle.join().unwrap(), Err(ChannelError::Broken));
	}

	#[test]
	fn test_drop_after_fulfill_does_not_break() {
		let (promise, future) = create();
		promise.fulfill(5).unwrap();
		drop(promise);

		assert_eq!(future.get(), Ok(5));
	}

	#[test]
	fn test_dropping_readers_has_no_effect() {
		let (promise, future) = create();
		drop(future);

		promise.fulfill(3).unwrap();
		assert_eq!(promise.future().get(), Ok(3));
	}

	#[test]
	fn test_try_get() {
		let (promise, future) = create();
		assert_eq!(future.try_get(), None);
		assert!(!future.is_ready());

		promise.fulfill(9).unwrap();
		assert_eq!(future.try_get(), Some(Ok(9)));
		assert!(future.is_ready());
	}
}

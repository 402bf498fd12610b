// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 troupe

//! Actor model: mailboxes, the run loop, the system, and message timers.

pub mod context;
pub mod mailbox;
pub mod runner;
pub mod system;
pub mod timers;
pub mod traits;

pub use context::{Context, HandlerFault};
pub use mailbox::{ActorRef, Mailbox, SendError, create_mailbox};
pub use runner::ActorRunner;
pub use system::{ActorHandle, ActorSystem, JoinError, SchedulingPolicy, SystemConfig};
pub use timers::{TimerHandle, schedule_once, schedule_repeat};
pub use traits::{Actor, Flow};

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A minimal effect-runtime layer the stream protocol is built on.
//!
//! `Stream` treats `IO`, `Queue`, `Managed`, `Promise`, `Schedule` and
//! `Clock` as abstract collaborators. This module gives each of them a
//! concrete shape on top of `tokio`, the way `futures_ext` layers extension
//! traits on top of the `futures` crate it depends on rather than
//! reinventing futures itself.

/// The effect runtime's notion of the current time.
pub mod clock;
/// A cheaply cloneable, `Send + Sync` error wrapper.
pub mod error;
/// A reference-counted resource with a release action.
pub mod managed;
/// A single-assignment, multi-waiter cell.
pub mod promise;
/// A bounded async FIFO queue.
pub mod queue;
/// Retry/repeat policies for scheduled effects.
pub mod schedule;
/// A structured-concurrency scope for background fibers.
pub mod supervisor;

pub use clock::{Clock, SystemClock};
pub use error::SharedError;
pub use managed::Managed;
pub use promise::Promise;
pub use queue::Queue;
pub use schedule::{Decision, Schedule};
pub use supervisor::Supervisor;

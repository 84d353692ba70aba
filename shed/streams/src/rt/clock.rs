/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The clock abstraction `Schedule` is driven against.

use async_trait::async_trait;
use std::time::{Duration, Instant};

/// A source of time, abstracted so that `Schedule`-driven combinators
/// (`repeat`, `repeatElems`) can be tested deterministically with
/// `tokio::time::pause`/`advance` instead of real wall-clock delays.
#[async_trait]
pub trait Clock: Send + Sync {
    /// The current instant, as observed by this clock.
    fn now(&self) -> Instant;

    /// Suspend the calling fiber for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// The production [`Clock`], backed by [`tokio::time`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A structured-concurrency group for the background fibers forked by the
//! concurrent combinators.
//!
//! `merge`/`zip`/`join_with` each fork one fiber per source; `supervised`
//! (spec.md §4.4.2) means those fibers are interrupted whenever the
//! consumer loop exits for *any* reason, including early `Stop`, failure,
//! or the outer task being cancelled. A `Supervisor` is the structured
//! handle for that: every [`tokio::task::JoinHandle`] registered with it is
//! aborted when the `Supervisor` is dropped, the same guaranteed-once
//! cleanup-on-every-exit-path idea as the teacher's `OnCancel` combinator
//! (`shed/futures_ext/src/future/on_cancel.rs`), lifted from a single
//! future to a set of fibers.
/// A structured-concurrency scope owning background fiber handles.
pub struct Supervisor {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Supervisor {
    /// An empty supervision scope.
    pub fn new() -> Self {
        Supervisor {
            handles: Vec::new(),
        }
    }

    /// Fork `fut` as a supervised background fiber.
    pub fn spawn<F>(&mut self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.handles.push(tokio::spawn(fut));
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Supervisor::new()
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn dropping_the_supervisor_aborts_its_fibers() {
        let ran_to_completion = Arc::new(AtomicBool::new(false));
        let mut sup = Supervisor::new();
        let flag = ran_to_completion.clone();
        sup.spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            flag.store(true, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;
        drop(sup);
        tokio::task::yield_now().await;
        assert!(!ran_to_completion.load(Ordering::SeqCst));
    }
}

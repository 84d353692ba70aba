/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A single-assignment cell that other fibers can await.

use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A cell that is written at most once and can be awaited by any number of
/// fibers, each receiving a clone of the completed value.
pub struct Promise<A> {
    state: Arc<Mutex<Option<A>>>,
    notify: Arc<Notify>,
}

impl<A> Clone for Promise<A> {
    fn clone(&self) -> Self {
        Promise {
            state: self.state.clone(),
            notify: self.notify.clone(),
        }
    }
}

impl<A: Clone + Send + 'static> Promise<A> {
    /// Create an unset promise.
    pub fn new() -> Self {
        Promise {
            state: Arc::new(Mutex::new(None)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Complete the promise. Returns `false` if it was already completed;
    /// a `Promise` is single-assignment, so later completions are no-ops.
    pub fn complete(&self, value: A) -> bool {
        let mut guard = self.state.lock().expect("promise lock poisoned");
        if guard.is_some() {
            return false;
        }
        *guard = Some(value);
        drop(guard);
        self.notify.notify_waiters();
        true
    }

    /// Suspend until the promise is completed, then return a clone of the
    /// value.
    pub async fn await_value(&self) -> A {
        loop {
            let notified = self.notify.notified();
            {
                let guard = self.state.lock().expect("promise lock poisoned");
                if let Some(v) = guard.as_ref() {
                    return v.clone();
                }
            }
            notified.await;
        }
    }

    /// Non-blocking read: `Some` if already completed.
    pub fn peek(&self) -> Option<A> {
        self.state.lock().expect("promise lock poisoned").clone()
    }
}

impl<A: Clone + Send + 'static> Default for Promise<A> {
    fn default() -> Self {
        Promise::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn await_after_complete_returns_immediately() {
        let p = Promise::new();
        p.complete(5);
        assert_eq!(p.await_value().await, 5);
    }

    #[tokio::test]
    async fn await_before_complete_unblocks_on_completion() {
        let p = Promise::new();
        let p2 = p.clone();
        let handle = tokio::spawn(async move { p2.await_value().await });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        p.complete(7);
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn second_complete_is_ignored() {
        let p = Promise::new();
        assert!(p.complete(1));
        assert!(!p.complete(2));
        assert_eq!(p.await_value().await, 1);
    }

    #[tokio::test]
    async fn multiple_waiters_all_observe_the_value() {
        let p = Promise::new();
        let p1 = p.clone();
        let p2 = p.clone();
        let h1 = tokio::spawn(async move { p1.await_value().await });
        let h2 = tokio::spawn(async move { p2.await_value().await });
        tokio::task::yield_now().await;
        p.complete(9);
        assert_eq!(h1.await.unwrap(), 9);
        assert_eq!(h2.await.unwrap(), 9);
    }
}

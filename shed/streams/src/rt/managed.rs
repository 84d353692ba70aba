/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A scoped resource with a release action guaranteed to run on every exit.
//!
//! Grounded on the teacher's `OnCancel` future combinator
//! (`shed/futures_ext/src/future/on_cancel.rs`), which runs its cleanup
//! closure exactly once whether the wrapped future completes normally or is
//! dropped before completion. `Managed` generalizes that one-shot idea to an
//! acquired value: the release closure runs when the `Managed` is dropped,
//! whether that happens because the scope ended normally, the fold returned
//! `Stop`, an error propagated, or the enclosing task was cancelled.

/// An acquired resource of type `A` together with its release action.
///
/// `Managed<A>` derefs to `A` so callers can use the resource directly; the
/// release closure fires exactly once, on drop.
pub struct Managed<A> {
    value: Option<A>,
    release: Option<Box<dyn FnOnce(A) + Send>>,
}

impl<A> Managed<A> {
    /// Acquire `value`, registering `release` to run when the `Managed` is
    /// dropped.
    pub fn new(value: A, release: impl FnOnce(A) + Send + 'static) -> Self {
        Managed {
            value: Some(value),
            release: Some(Box::new(release)),
        }
    }

    /// A `Managed` whose release action does nothing, for resources that
    /// need no cleanup (e.g. a value already owned outright).
    pub fn no_release(value: A) -> Self {
        Managed {
            value: Some(value),
            release: None,
        }
    }

    /// Borrow the managed value.
    pub fn get(&self) -> &A {
        self.value.as_ref().expect("Managed value taken twice")
    }

    /// Mutably borrow the managed value.
    pub fn get_mut(&mut self) -> &mut A {
        self.value.as_mut().expect("Managed value taken twice")
    }

    /// Run the release action now instead of waiting for drop, consuming
    /// the `Managed`.
    pub fn release_now(mut self) {
        if let (Some(value), Some(release)) = (self.value.take(), self.release.take()) {
            release(value);
        }
    }
}

impl<A> std::ops::Deref for Managed<A> {
    type Target = A;

    fn deref(&self) -> &A {
        self.get()
    }
}

impl<A> std::ops::DerefMut for Managed<A> {
    fn deref_mut(&mut self) -> &mut A {
        self.get_mut()
    }
}

impl<A> Drop for Managed<A> {
    fn drop(&mut self) {
        if let (Some(value), Some(release)) = (self.value.take(), self.release.take()) {
            release(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn release_runs_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        {
            let r = released.clone();
            let m = Managed::new(42, move |_| {
                r.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(*m, 42);
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_runs_exactly_once_with_release_now() {
        let released = Arc::new(AtomicUsize::new(0));
        let r = released.clone();
        let m = Managed::new(42, move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });
        m.release_now();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_release_does_not_panic() {
        let m = Managed::no_release(1);
        drop(m);
    }
}

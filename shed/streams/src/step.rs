/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Early-exit signalling for the fold protocol.

/// The result of a single fold step: either carry on with the new state, or
/// stop folding and return it.
///
/// `Stop` is authoritative: once any step produces `Stop`, no further
/// elements are emitted and every enclosing combinator must propagate the
/// stop instead of continuing to fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<S> {
    /// Continue folding with the given carrier.
    Cont(S),
    /// Stop folding; the given carrier is the final result.
    Stop(S),
}

impl<S> Step<S> {
    /// Project the carrier out, discarding whether folding should continue.
    pub fn extract(self) -> S {
        match self {
            Step::Cont(s) | Step::Stop(s) => s,
        }
    }

    /// Apply `f` to the carrier, preserving the `Cont`/`Stop` tag.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> Step<T> {
        match self {
            Step::Cont(s) => Step::Cont(f(s)),
            Step::Stop(s) => Step::Stop(f(s)),
        }
    }

    /// Eliminate the `Step` by dispatching to one of two continuations.
    pub fn fold<T>(self, on_cont: impl FnOnce(S) -> T, on_stop: impl FnOnce(S) -> T) -> T {
        match self {
            Step::Cont(s) => on_cont(s),
            Step::Stop(s) => on_stop(s),
        }
    }

    /// True if this step asks the fold to continue.
    pub fn is_cont(&self) -> bool {
        matches!(self, Step::Cont(_))
    }

    /// True if this step asks the fold to stop.
    pub fn is_stop(&self) -> bool {
        matches!(self, Step::Stop(_))
    }

    /// Replace a `Cont` with `Stop` while keeping the same carrier; a
    /// `Stop` is left untouched. Used by combinators (`takeWhile`, `take`)
    /// that need to force early exit once a condition trips.
    pub fn stop_if(self, stop: bool) -> Self {
        match self {
            Step::Cont(s) if stop => Step::Stop(s),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_ignores_tag() {
        assert_eq!(Step::Cont(1).extract(), 1);
        assert_eq!(Step::Stop(1).extract(), 1);
    }

    #[test]
    fn map_preserves_tag() {
        assert_eq!(Step::Cont(1).map(|s| s + 1), Step::Cont(2));
        assert_eq!(Step::Stop(1).map(|s| s + 1), Step::Stop(2));
    }

    #[test]
    fn fold_dispatches() {
        let r = Step::Cont(1).fold(|s| s + 10, |s| s + 100);
        assert_eq!(r, 11);
        let r = Step::Stop(1).fold(|s| s + 10, |s| s + 100);
        assert_eq!(r, 101);
    }

    #[test]
    fn stop_if_only_converts_cont() {
        assert_eq!(Step::Cont(1).stop_if(true), Step::Stop(1));
        assert_eq!(Step::Cont(1).stop_if(false), Step::Cont(1));
        assert_eq!(Step::Stop(1).stop_if(true), Step::Stop(1));
    }
}

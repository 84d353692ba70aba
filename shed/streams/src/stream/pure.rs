/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The synchronous refinement of [`Stream`](super::Stream) for sources that
//! never suspend and never fail.
//!
//! `fold_pure` is not derived from `fold`, nor the other way around: both
//! are independent implementations a pure constructor provides side by
//! side, so that a consumer which only needs pure semantics can skip the
//! effect runtime entirely, and so that tests can check the two agree
//! (the "pure/effectful agreement" property).

use crate::step::Step;

/// A stream that can be folded synchronously, with no effects and no
/// possibility of failure.
pub trait StreamPure<A>: Send + Sync {
    /// The synchronous counterpart of `Stream::fold`.
    fn fold_pure<S>(&self, init: S, step: impl FnMut(S, A) -> Step<S>) -> Step<S>;

    /// Collect every element into a `Vec`, bypassing the effect runtime.
    fn to_vec_pure(&self) -> Vec<A> {
        self.fold_pure(Vec::new(), |mut acc, a| {
            acc.push(a);
            Step::Cont(acc)
        })
        .extract()
    }
}

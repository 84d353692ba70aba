/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The fold-driven stream protocol and every combinator built on it.
//!
//! A [`Stream`] is any value that can answer an effectful fold request: for
//! every element it produces, call the caller's `step` function, in order,
//! until either the source is exhausted or `step` signals early exit via
//! [`Step::Stop`]. Every combinator in this module is implemented by
//! wrapping or composing such folds; nothing here inspects the carrier type
//! `S` the caller chooses, which is the one genuinely hard part of
//! translating this design into Rust (see the module docs on
//! [`dynstream`] for how heterogeneous streams are boxed together).

/// `StreamExt`: `map`/`filter`/`take`/`scan`/... built on [`Stream::fold`].
pub mod combinators;
/// `merge`/`zip`/`join_with`/`to_queue`: running more than one stream at once.
pub mod concurrent;
/// Building a [`Stream`] from scratch: literals, iterables, effects, corecursion.
pub mod constructors;
/// Type-erasing heterogeneous streams behind one concrete type.
pub mod dynstream;
/// Splitting a stream into a sink-consumed prefix and its tail.
pub mod peel;
/// The synchronous refinement of [`Stream`] for pure sources.
pub mod pure;
/// Running a stream to completion: `to_vec`, `foreach`, `run`, `is_empty`.
pub mod terminal;
/// Driving a sink to completion against a stream, discarding any tail.
pub mod transduce;

use crate::step::Step;
use futures::future::BoxFuture;
use std::sync::Arc;

pub use dynstream::BoxStream;
pub use pure::StreamPure;

/// A single step function: given the current carrier and a produced
/// element, decide how to continue.
pub type StepFn<S, A, E> = Box<dyn FnMut(S, A) -> BoxFuture<'static, Result<Step<S>, E>> + Send>;

/// The future a fold eventually resolves to.
pub type FoldResult<S, E> = BoxFuture<'static, Result<Step<S>, E>>;

/// The fold-driven stream protocol (spec.md §4.1).
///
/// `fold` is the single primitive every combinator is built from. It is
/// generic over the caller-chosen carrier `S`; because Rust traits can't
/// express rank-2 polymorphism directly, streams are always held behind an
/// `Arc` so `fold` can take `self: Arc<Self>` and return a `'static`
/// future without borrowing the stream value itself (the alternative from
/// the design notes — CPS-encoding as `fn(step: Box<dyn FnMut...>)` — is
/// exactly what `StepFn` is).
pub trait Stream<E, A>: Send + Sync
where
    E: Send + 'static,
    A: Send + 'static,
{
    /// Drive the stream with seed `init`, invoking `step` for every
    /// produced element in emission order. Returns `Cont(s)` if the source
    /// was exhausted, `Stop(s)` if `step` asked to stop early.
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static;

    /// The early-exit variant: emission continues only while `cont(&s)`
    /// holds. The default derivation wraps `step` to convert `Cont` into
    /// `Stop` the moment `cont` trips, per spec.md §4.1.
    fn fold_lazy<S>(
        self: Arc<Self>,
        init: S,
        cont: Arc<dyn Fn(&S) -> bool + Send + Sync>,
        mut step: StepFn<S, A, E>,
    ) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        if !cont(&init) {
            return Box::pin(async move { Ok(Step::Stop(init)) });
        }
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let fut = step(s, a);
            let cont = cont.clone();
            Box::pin(async move {
                let st = fut.await?;
                Ok(match st {
                    Step::Cont(s) if !cont(&s) => Step::Stop(s),
                    other => other,
                })
            })
        });
        self.fold(init, wrapped)
    }

    /// Fast path for sources that are also [`StreamPure`]: run `step`
    /// synchronously, without ever constructing a boxed future, and
    /// without the caller having to know the concrete source type. The
    /// default returns `None` ("not available, fall back to `fold`");
    /// constructors that also implement `StreamPure` (`from_iterable`,
    /// `range`, `unfold`) override it to delegate to their `fold_pure`.
    fn try_fold_pure<S>(&self, _init: S, _step: &mut dyn FnMut(S, A) -> Step<S>) -> Option<Step<S>>
    where
        S: Send + 'static,
    {
        None
    }

    /// Pure, non-failing left fold: derived from `fold_lazy` with
    /// `cont = true` always, per spec.md §4.1.
    fn fold_left<S>(
        self: Arc<Self>,
        init: S,
        combine: Arc<dyn Fn(S, A) -> S + Send + Sync>,
    ) -> BoxFuture<'static, Result<S, E>>
    where
        S: Send + 'static,
    {
        let step: StepFn<S, A, E> = Box::new(move |s, a| {
            let s = combine(s, a);
            Box::pin(async move { Ok(Step::Cont(s)) })
        });
        let always: Arc<dyn Fn(&S) -> bool + Send + Sync> = Arc::new(|_: &S| true);
        let fut = self.fold_lazy(init, always, step);
        Box::pin(async move { fut.await.map(Step::extract) })
    }
}

/// Build a `cont` predicate that is always true; shared by several
/// combinators that need `fold_lazy`'s machinery without early exit of
/// their own.
pub(crate) fn always<S>() -> Arc<dyn Fn(&S) -> bool + Send + Sync>
where
    S: 'static,
{
    Arc::new(|_: &S| true)
}

/// A downstream step function shared across more than one nested fold.
///
/// Combinators that delegate to another stream's `fold` while needing to
/// reuse the *same* caller-supplied `step` afterwards (`concat`'s second
/// half, `flatMap`'s per-element inner stream, the producer fibers in
/// `merge`/`zip`/`joinWith`) can't just move `step` into a fresh `async
/// move` block per call: `step` lives in an `FnMut` closure's environment
/// and has to survive for the closure's next invocation, but a nested
/// `async move` block that calls it would have to take ownership of it to
/// satisfy the `'static` bound on the future it returns. Wrapping it once
/// in an `Arc<Mutex<_>>` lets every nested call clone a cheap handle
/// instead of moving the original.
pub(crate) type SharedStep<S, A, E> = Arc<tokio::sync::Mutex<StepFn<S, A, E>>>;

pub(crate) fn share_step<S, A, E>(step: StepFn<S, A, E>) -> SharedStep<S, A, E> {
    Arc::new(tokio::sync::Mutex::new(step))
}

pub(crate) fn call_shared<S, A, E>(shared: SharedStep<S, A, E>, s: S, a: A) -> FoldResult<S, E>
where
    S: Send + 'static,
    A: Send + 'static,
    E: Send + 'static,
{
    Box::pin(async move {
        let mut step = shared.lock().await;
        (step)(s, a).await
    })
}

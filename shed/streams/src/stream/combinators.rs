/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The sequential combinators: one upstream in, one (possibly
//! differently-typed) stream out.
//!
//! Combinators that call the downstream `step` exactly once per upstream
//! element, synchronously, just wrap it in a plain `FnMut` closure. The few
//! that need to await something first, call `step` more than once per
//! upstream element, or hand `step` to a second stream's `fold` go through
//! [`super::share_step`] instead; see that function's doc comment for why.

use super::dynstream::BoxStream;
use super::{call_shared, share_step, FoldResult, Stream, StepFn};
use crate::rt::{Clock, Decision, Schedule};
use crate::step::Step;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Extension methods available on every [`Stream`]; `self` must already be
/// held behind an `Arc` (as every constructor in this crate returns it).
pub trait StreamExt<E, A>: Stream<E, A> + Sized + 'static
where
    E: Send + 'static,
    A: Send + 'static,
{
    fn map<B, F>(self: Arc<Self>, f: F) -> Arc<Map<Self, F>>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Arc::new(Map {
            upstream: self,
            f: Arc::new(f),
        })
    }

    fn map_m<B, F, Fut>(self: Arc<Self>, f: F) -> Arc<MapM<Self, F>>
    where
        B: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<B, E>> + Send + 'static,
    {
        Arc::new(MapM {
            upstream: self,
            f: Arc::new(move |a| Box::pin(f(a))),
        })
    }

    fn filter<P>(self: Arc<Self>, p: P) -> Arc<Filter<Self, P>>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Arc::new(Filter {
            upstream: self,
            p: Arc::new(p),
        })
    }

    fn filter_not<P>(
        self: Arc<Self>,
        p: P,
    ) -> Arc<Filter<Self, Box<dyn Fn(&A) -> bool + Send + Sync>>>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let negated: Box<dyn Fn(&A) -> bool + Send + Sync> = Box::new(move |a: &A| !p(a));
        self.filter(negated)
    }

    fn collect<B, F>(self: Arc<Self>, f: F) -> Arc<Collect<Self, F>>
    where
        B: Send + 'static,
        F: Fn(A) -> Option<B> + Send + Sync + 'static,
    {
        Arc::new(Collect {
            upstream: self,
            f: Arc::new(f),
        })
    }

    fn map_concat<B, I, F>(self: Arc<Self>, f: F) -> Arc<MapConcat<Self, F>>
    where
        B: Send + 'static,
        I: IntoIterator<Item = B> + Send + 'static,
        F: Fn(A) -> I + Send + Sync + 'static,
    {
        Arc::new(MapConcat {
            upstream: self,
            f: Arc::new(f),
        })
    }

    fn flat_map<B, F>(self: Arc<Self>, f: F) -> Arc<FlatMap<Self, F>>
    where
        B: Send + 'static,
        F: Fn(A) -> BoxStream<E, B> + Send + Sync + 'static,
    {
        Arc::new(FlatMap {
            upstream: self,
            f: Arc::new(f),
        })
    }

    fn concat<Other>(self: Arc<Self>, other: Arc<Other>) -> Arc<Concat<Self, Other>>
    where
        Other: Stream<E, A> + 'static,
    {
        Arc::new(Concat { a: self, b: other })
    }

    fn drop_while<P>(self: Arc<Self>, p: P) -> Arc<DropWhile<Self, P>>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Arc::new(DropWhile {
            upstream: self,
            p: Arc::new(p),
        })
    }

    fn take_while<P>(self: Arc<Self>, p: P) -> Arc<TakeWhile<Self, P>>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Arc::new(TakeWhile {
            upstream: self,
            p: Arc::new(p),
        })
    }

    fn drop(self: Arc<Self>, n: usize) -> Arc<Drop<Self>> {
        Arc::new(Drop {
            upstream: self,
            n,
        })
    }

    fn take(self: Arc<Self>, n: usize) -> Arc<Take<Self>> {
        Arc::new(Take {
            upstream: self,
            n,
        })
    }

    fn zip_with_index(self: Arc<Self>) -> Arc<ZipWithIndex<Self>> {
        Arc::new(ZipWithIndex { upstream: self })
    }

    fn scan<S0, F>(self: Arc<Self>, zero: S0, f: F) -> Arc<Scan<Self, S0, F>>
    where
        S0: Clone + Send + 'static,
        F: Fn(S0, A) -> S0 + Send + Sync + 'static,
    {
        Arc::new(Scan {
            upstream: self,
            zero,
            f: Arc::new(f),
        })
    }

    fn scan_m<S0, F, Fut>(self: Arc<Self>, zero: S0, f: F) -> Arc<ScanM<Self, S0, F>>
    where
        S0: Clone + Send + 'static,
        F: Fn(S0, A) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<S0, E>> + Send + 'static,
    {
        Arc::new(ScanM {
            upstream: self,
            zero,
            f: Arc::new(f),
        })
    }

    fn with_effect<F, Fut>(self: Arc<Self>, f: F) -> Arc<WithEffect<Self, F>>
    where
        F: Fn(&A) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), E>> + Send + 'static,
    {
        Arc::new(WithEffect {
            upstream: self,
            f: Arc::new(f),
        })
    }

    fn forever(self: Arc<Self>) -> Arc<Forever<Self>> {
        Arc::new(Forever { upstream: self })
    }

    fn repeat<Sch>(self: Arc<Self>, schedule: Sch, clock: Arc<dyn Clock>) -> Arc<Repeat<Self, Sch>>
    where
        Sch: Schedule<()> + 'static,
    {
        Arc::new(Repeat {
            upstream: self,
            schedule: Arc::new(schedule),
            clock,
        })
    }

    fn repeat_elems<Sch>(
        self: Arc<Self>,
        schedule: Sch,
        clock: Arc<dyn Clock>,
    ) -> Arc<RepeatElems<Self, Sch>>
    where
        A: Clone,
        Sch: Schedule<A> + 'static,
    {
        Arc::new(RepeatElems {
            upstream: self,
            schedule: Arc::new(schedule),
            clock,
        })
    }
}

impl<E, A, St> StreamExt<E, A> for St
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
}

/// See [`StreamExt::map`].
pub struct Map<Up, F> {
    upstream: Arc<Up>,
    f: Arc<F>,
}

impl<E, A, B, Up, F> Stream<E, B> for Map<Up, F>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, B, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let f = self.f.clone();
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| step(s, f(a)));
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::map_m`].
pub struct MapM<Up, F> {
    upstream: Arc<Up>,
    f: Arc<F>,
}

impl<E, A, B, Up, F> Stream<E, B> for MapM<Up, F>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(A) -> BoxFuture<'static, Result<B, E>> + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, B, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let f = self.f.clone();
        let shared = share_step(step);
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let f = f.clone();
            let shared = shared.clone();
            Box::pin(async move {
                let b = f(a).await?;
                call_shared(shared, s, b).await
            })
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::filter`].
pub struct Filter<Up, P> {
    upstream: Arc<Up>,
    p: Arc<P>,
}

impl<E, A, Up, P> Stream<E, A> for Filter<Up, P>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let p = self.p.clone();
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            if p(&a) {
                step(s, a)
            } else {
                Box::pin(async move { Ok(Step::Cont(s)) })
            }
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::collect`].
pub struct Collect<Up, F> {
    upstream: Arc<Up>,
    f: Arc<F>,
}

impl<E, A, B, Up, F> Stream<E, B> for Collect<Up, F>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(A) -> Option<B> + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, B, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let f = self.f.clone();
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| match f(a) {
            Some(b) => step(s, b),
            None => Box::pin(async move { Ok(Step::Cont(s)) }),
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::map_concat`].
pub struct MapConcat<Up, F> {
    upstream: Arc<Up>,
    f: Arc<F>,
}

impl<E, A, B, I, Up, F> Stream<E, B> for MapConcat<Up, F>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    I: IntoIterator<Item = B> + Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(A) -> I + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, B, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let f = self.f.clone();
        let shared = share_step(step);
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let f = f.clone();
            let shared = shared.clone();
            Box::pin(async move {
                let mut state = s;
                for b in f(a) {
                    match call_shared(shared.clone(), state, b).await? {
                        Step::Cont(s2) => state = s2,
                        Step::Stop(s2) => return Ok(Step::Stop(s2)),
                    }
                }
                Ok(Step::Cont(state))
            })
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::flat_map`].
pub struct FlatMap<Up, F> {
    upstream: Arc<Up>,
    f: Arc<F>,
}

impl<E, A, B, Up, F> Stream<E, B> for FlatMap<Up, F>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(A) -> BoxStream<E, B> + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, B, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let f = self.f.clone();
        let shared = share_step(step);
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let f = f.clone();
            let shared = shared.clone();
            Box::pin(async move {
                let inner = f(a);
                let inner_step: StepFn<S, B, E> =
                    Box::new(move |s, b| call_shared(shared.clone(), s, b));
                Arc::new(inner).fold(s, inner_step).await
            })
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

fn identity_stream<E, A>(s: BoxStream<E, A>) -> BoxStream<E, A> {
    s
}

/// Flatten a stream of streams into their concatenated elements:
/// `ss.flat_map(identity)`.
pub fn flatten<E, A, St>(
    ss: Arc<St>,
) -> Arc<FlatMap<St, fn(BoxStream<E, A>) -> BoxStream<E, A>>>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, BoxStream<E, A>> + 'static,
{
    ss.flat_map(identity_stream::<E, A> as fn(BoxStream<E, A>) -> BoxStream<E, A>)
}

/// See [`StreamExt::concat`].
pub struct Concat<A, B> {
    a: Arc<A>,
    b: Arc<B>,
}

impl<E, T, Sa, Sb> Stream<E, T> for Concat<Sa, Sb>
where
    E: Send + 'static,
    T: Send + 'static,
    Sa: Stream<E, T> + 'static,
    Sb: Stream<E, T> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, T, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let shared = share_step(step);
        let a = self.a.clone();
        let b = self.b.clone();
        Box::pin(async move {
            let step_a: StepFn<S, T, E> = {
                let shared = shared.clone();
                Box::new(move |s, x| call_shared(shared.clone(), s, x))
            };
            match a.fold(init, step_a).await? {
                Step::Stop(s) => Ok(Step::Stop(s)),
                Step::Cont(s) => {
                    let step_b: StepFn<S, T, E> =
                        Box::new(move |s, x| call_shared(shared.clone(), s, x));
                    b.fold(s, step_b).await
                }
            }
        })
    }
}

/// See [`StreamExt::drop_while`].
pub struct DropWhile<Up, P> {
    upstream: Arc<Up>,
    p: Arc<P>,
}

impl<E, A, Up, P> Stream<E, A> for DropWhile<Up, P>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let p = self.p.clone();
        let mut dropping = true;
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            if dropping && p(&a) {
                Box::pin(async move { Ok(Step::Cont(s)) })
            } else {
                dropping = false;
                step(s, a)
            }
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::take_while`].
pub struct TakeWhile<Up, P> {
    upstream: Arc<Up>,
    p: Arc<P>,
}

impl<E, A, Up, P> Stream<E, A> for TakeWhile<Up, P>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
    P: Fn(&A) -> bool + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let p = self.p.clone();
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            if p(&a) {
                step(s, a)
            } else {
                Box::pin(async move { Ok(Step::Stop(s)) })
            }
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::drop`].
pub struct Drop<Up> {
    upstream: Arc<Up>,
    n: usize,
}

impl<E, A, Up> Stream<E, A> for Drop<Up>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let mut remaining = self.n;
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            if remaining > 0 {
                remaining -= 1;
                Box::pin(async move { Ok(Step::Cont(s)) })
            } else {
                step(s, a)
            }
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::take`]. Takes the first `n` elements, full stop — not
/// `takeWhile` keyed on a running index, which silently breaks the moment
/// any upstream stage reorders or fans elements out.
pub struct Take<Up> {
    upstream: Arc<Up>,
    n: usize,
}

impl<E, A, Up> Stream<E, A> for Take<Up>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let mut remaining = self.n;
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            if remaining == 0 {
                return Box::pin(async move { Ok(Step::Stop(s)) });
            }
            remaining -= 1;
            let last = remaining == 0;
            let fut = step(s, a);
            Box::pin(async move {
                let st = fut.await?;
                Ok(st.stop_if(last))
            })
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::zip_with_index`].
pub struct ZipWithIndex<Up> {
    upstream: Arc<Up>,
}

impl<E, A, Up> Stream<E, (A, usize)> for ZipWithIndex<Up>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, (A, usize), E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let mut index = 0usize;
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let i = index;
            index += 1;
            step(s, (a, i))
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::scan`]. Emits one running total per upstream element;
/// the seed itself is never emitted.
pub struct Scan<Up, S0, F> {
    upstream: Arc<Up>,
    zero: S0,
    f: Arc<F>,
}

impl<E, A, S0, Up, F> Stream<E, S0> for Scan<Up, S0, F>
where
    E: Send + 'static,
    A: Send + 'static,
    S0: Clone + Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(S0, A) -> S0 + Send + Sync + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, S0, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let zero = self.zero.clone();
        let f = self.f.clone();
        let upstream = self.upstream.clone();
        let mut acc = zero;
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            acc = f(acc.clone(), a);
            step(s, acc.clone())
        });
        upstream.fold(init, wrapped)
    }
}

/// The effectful counterpart of [`Scan`]: `f` may suspend or fail.
pub struct ScanM<Up, S0, F> {
    upstream: Arc<Up>,
    zero: S0,
    f: Arc<F>,
}

impl<E, A, S0, Up, F, Fut> Stream<E, S0> for ScanM<Up, S0, F>
where
    E: Send + 'static,
    A: Send + 'static,
    S0: Clone + Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(S0, A) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<S0, E>> + Send + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, S0, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let zero = self.zero.clone();
        let f = self.f.clone();
        let upstream = self.upstream.clone();
        let shared = share_step(step);
        let acc = Arc::new(tokio::sync::Mutex::new(zero));
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let f = f.clone();
            let shared = shared.clone();
            let acc = acc.clone();
            Box::pin(async move {
                let mut acc_guard = acc.lock().await;
                let next = f(acc_guard.clone(), a).await?;
                *acc_guard = next.clone();
                drop(acc_guard);
                call_shared(shared, s, next).await
            })
        });
        upstream.fold(init, wrapped)
    }
}

/// See [`StreamExt::with_effect`]: runs `f` for its side effect, then
/// passes the element through unchanged. Used to hang observation (e.g.
/// logging a count every N elements) off a stream without altering it.
pub struct WithEffect<Up, F> {
    upstream: Arc<Up>,
    f: Arc<F>,
}

impl<E, A, Up, F, Fut> Stream<E, A> for WithEffect<Up, F>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
    F: Fn(&A) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), E>> + Send + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let f = self.f.clone();
        let shared = share_step(step);
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a| {
            let f = f.clone();
            let shared = shared.clone();
            Box::pin(async move {
                f(&a).await?;
                call_shared(shared, s, a).await
            })
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

/// See [`StreamExt::forever`]: restarts the upstream the instant it is
/// exhausted, so the only ways this stream ends are early `Stop` or
/// failure.
pub struct Forever<Up> {
    upstream: Arc<Up>,
}

impl<E, A, Up> Stream<E, A> for Forever<Up>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let upstream = self.upstream.clone();
        let shared = share_step(step);
        Box::pin(async move {
            let mut state = init;
            loop {
                let wrapped: StepFn<S, A, E> = {
                    let shared = shared.clone();
                    Box::new(move |s, a| call_shared(shared.clone(), s, a))
                };
                match upstream.clone().fold(state, wrapped).await? {
                    Step::Stop(s) => return Ok(Step::Stop(s)),
                    Step::Cont(s) => state = s,
                }
            }
        })
    }
}

/// See [`StreamExt::repeat`]: re-runs the whole upstream each time
/// `schedule` decides to continue, sleeping for its chosen delay first.
pub struct Repeat<Up, Sch> {
    upstream: Arc<Up>,
    schedule: Arc<Sch>,
    clock: Arc<dyn Clock>,
}

impl<E, A, Up, Sch> Stream<E, A> for Repeat<Up, Sch>
where
    E: Send + 'static,
    A: Send + 'static,
    Up: Stream<E, A> + 'static,
    Sch: Schedule<()> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let upstream = self.upstream.clone();
        let schedule = self.schedule.clone();
        let clock = self.clock.clone();
        let shared = share_step(step);
        Box::pin(async move {
            let mut state = init;
            let mut sched_state = schedule.initial();
            loop {
                let wrapped: StepFn<S, A, E> = {
                    let shared = shared.clone();
                    Box::new(move |s, a| call_shared(shared.clone(), s, a))
                };
                match upstream.clone().fold(state, wrapped).await? {
                    Step::Stop(s) => return Ok(Step::Stop(s)),
                    Step::Cont(s) => match schedule.update(&(), sched_state, &*clock) {
                        Decision::Stop => return Ok(Step::Cont(s)),
                        Decision::Continue { delay, state: next } => {
                            clock.sleep(delay).await;
                            sched_state = next;
                            state = s;
                        }
                    },
                }
            }
        })
    }
}

/// See [`StreamExt::repeat_elems`]: re-emits each produced element as many
/// times as `schedule` (reset per element) decides, with its chosen delay
/// between repeats.
pub struct RepeatElems<Up, Sch> {
    upstream: Arc<Up>,
    schedule: Arc<Sch>,
    clock: Arc<dyn Clock>,
}

impl<E, A, Up, Sch> Stream<E, A> for RepeatElems<Up, Sch>
where
    E: Send + 'static,
    A: Clone + Send + 'static,
    Up: Stream<E, A> + 'static,
    Sch: Schedule<A> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let schedule = self.schedule.clone();
        let clock = self.clock.clone();
        let shared = share_step(step);
        let wrapped: StepFn<S, A, E> = Box::new(move |s, a: A| {
            let schedule = schedule.clone();
            let clock = clock.clone();
            let shared = shared.clone();
            Box::pin(async move {
                let mut st = call_shared(shared.clone(), s, a.clone()).await?;
                let mut sched_state = schedule.initial();
                loop {
                    let s2 = match st {
                        Step::Stop(s) => return Ok(Step::Stop(s)),
                        Step::Cont(s) => s,
                    };
                    match schedule.update(&a, sched_state, &*clock) {
                        Decision::Stop => return Ok(Step::Cont(s2)),
                        Decision::Continue { delay, state } => {
                            clock.sleep(delay).await;
                            sched_state = state;
                            st = call_shared(shared.clone(), s2, a.clone()).await?;
                        }
                    }
                }
            })
        });
        self.upstream.clone().fold(init, wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::constructors::from_iterable;
    use crate::stream::terminal::to_vec;

    #[tokio::test]
    async fn map_transforms_each_element() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]).map(|x| x * 2);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn filter_keeps_matching_elements() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4]).filter(|x| x % 2 == 0);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn collect_filters_and_maps_together() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4]).collect(|x| if x % 2 == 0 { Some(x * 10) } else { None });
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![20, 40]);
    }

    #[tokio::test]
    async fn map_concat_flattens_per_element_iterables() {
        let s = from_iterable::<String, _>(vec![1, 2]).map_concat(|x| vec![x, x]);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn flat_map_sequences_inner_streams() {
        let s = from_iterable::<String, _>(vec![1, 2]).flat_map(|x| {
            BoxStream::from_arc(from_iterable::<String, _>(vec![x, x * 10]))
        });
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![1, 10, 2, 20]);
    }

    #[tokio::test]
    async fn flatten_concatenates_a_stream_of_streams() {
        let ss = from_iterable::<String, _>(vec![
            BoxStream::from_arc(from_iterable::<String, _>(vec![1, 2])),
            BoxStream::from_arc(from_iterable::<String, _>(vec![3])),
            BoxStream::from_arc(from_iterable::<String, _>(Vec::<i32>::new())),
            BoxStream::from_arc(from_iterable::<String, _>(vec![4, 5])),
        ]);
        let s = flatten(ss);
        assert_eq!(
            to_vec::<String, _, _>(s).await.unwrap(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[tokio::test]
    async fn concat_runs_both_sides_in_order() {
        let s = from_iterable::<String, _>(vec![1, 2]).concat(from_iterable::<String, _>(vec![3, 4]));
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn drop_while_skips_the_leading_match() {
        let s = from_iterable::<String, _>(vec![1, 1, 2, 1]).drop_while(|x| *x == 1);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn take_while_stops_at_the_first_mismatch() {
        let s = from_iterable::<String, _>(vec![1, 1, 2, 1]).take_while(|x| *x == 1);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn drop_removes_exactly_n_leading_elements() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4]).drop(2);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![3, 4]);
    }

    #[tokio::test]
    async fn take_keeps_exactly_the_first_n_elements() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4]).take(2);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn take_zero_yields_nothing() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]).take(0);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), Vec::<i32>::new());
    }

    #[tokio::test]
    async fn zip_with_index_numbers_from_zero() {
        let s = from_iterable::<String, _>(vec!["a", "b", "c"]).zip_with_index();
        assert_eq!(
            to_vec::<String, _, _>(s).await.unwrap(),
            vec![("a", 0), ("b", 1), ("c", 2)]
        );
    }

    #[tokio::test]
    async fn scan_emits_one_running_total_per_element() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]).scan(0, |acc, x| acc + x);
        assert_eq!(to_vec::<String, _, _>(s).await.unwrap(), vec![1, 3, 6]);
    }

    #[tokio::test]
    async fn forever_keeps_restarting_until_stopped_early() {
        let s = from_iterable::<String, _>(vec![1, 2]).forever();
        let taken = s.take(5);
        assert_eq!(
            to_vec::<String, _, _>(taken).await.unwrap(),
            vec![1, 2, 1, 2, 1]
        );
    }
}

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Combinators that run more than one stream at once: `toQueue`, `merge`,
//! `zip` and `joinWith` (spec.md §4.4).
//!
//! Each forks one fiber per source stream, registered with a [`Supervisor`]
//! so that dropping the combined stream tears every fiber down. A fiber
//! folds its source stream and forwards each element as a [`Take`] onto a
//! bounded [`Queue`]; once its source is exhausted or fails it simply
//! returns, which is all `Take::End` forever requires (see the module docs
//! on [`crate::rt::queue`]).

use super::combinators::StreamExt;
use super::constructors::{from_queue, FromQueue};
use super::{FoldResult, Stream, StepFn};
use crate::rt::queue::QueueSender;
use crate::rt::{Queue, Supervisor};
use crate::step::Step;
use crate::take::Take;
use std::sync::Arc;

/// Either one of two element types, used by [`merge_either`] to tag which
/// source an element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

/// Fork `stream` as a background fiber that forwards its elements onto
/// `tx`, then exits. Shared by every combinator below.
pub(crate) fn spawn_producer<E, A, St>(
    stream: Arc<St>,
    tx: QueueSender<Take<E, A>>,
    supervisor: &mut Supervisor,
)
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    supervisor.spawn(async move {
        let tx_step = tx.clone();
        let step: StepFn<(), A, E> = Box::new(move |(), a| {
            let tx_step = tx_step.clone();
            Box::pin(async move {
                let _ = tx_step.offer(Take::Value(a)).await;
                Ok(Step::Cont(()))
            })
        });
        if let Err(e) = stream.fold((), step).await {
            let _ = tx.offer(Take::Fail(e)).await;
        }
        // `tx` (and the clone captured by `step`, already dropped at the
        // end of each call) go out of scope here; see the `End.forever`
        // idiom for why that alone is enough to signal completion.
    });
}

/// Wraps a stream so that a [`Supervisor`] (and whatever background fibers
/// it owns) stays alive for exactly as long as the wrapped stream does.
pub struct Supervised<St> {
    inner: Arc<St>,
    _supervisor: Supervisor,
}

impl<St> Supervised<St> {
    pub(crate) fn new(inner: Arc<St>, supervisor: Supervisor) -> Self {
        Supervised {
            inner,
            _supervisor: supervisor,
        }
    }
}

impl<E, A, St> Stream<E, A> for Supervised<St>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let inner = self.inner.clone();
        Box::pin(async move {
            let _keep_alive = self;
            inner.fold(init, step).await
        })
    }
}

/// Run `stream` in the background, forwarding its elements onto a freshly
/// created queue. The returned [`Supervisor`] owns the producer fiber; drop
/// it to interrupt production early.
pub fn to_queue<E, A, St>(stream: Arc<St>, capacity: usize) -> (Arc<Queue<Take<E, A>>>, Supervisor)
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    let (tx, queue) = Queue::bounded(capacity);
    let queue = Arc::new(queue);
    let mut supervisor = Supervisor::new();
    spawn_producer(stream, tx, &mut supervisor);
    (queue, supervisor)
}

/// Interleave `a` and `b` as they produce elements, in whatever order they
/// actually arrive. The merged stream ends once both sources have ended,
/// and fails as soon as either source fails.
pub fn merge<E, A, StA, StB>(
    a: Arc<StA>,
    b: Arc<StB>,
    capacity: usize,
) -> Arc<Supervised<FromQueue<E, A>>>
where
    E: Send + 'static,
    A: Send + 'static,
    StA: Stream<E, A> + 'static,
    StB: Stream<E, A> + 'static,
{
    let (tx, queue) = Queue::bounded(capacity);
    let queue = Arc::new(queue);
    let mut supervisor = Supervisor::new();
    spawn_producer(a, tx.clone(), &mut supervisor);
    spawn_producer(b, tx, &mut supervisor);
    Arc::new(Supervised {
        inner: from_queue(queue),
        _supervisor: supervisor,
    })
}

/// `merge` with each side mapped into a common element type first.
pub fn merge_with<E, A, B, C, StA, StB, F, G>(
    a: Arc<StA>,
    b: Arc<StB>,
    capacity: usize,
    f: F,
    g: G,
) -> Arc<Supervised<FromQueue<E, C>>>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    StA: Stream<E, A> + 'static,
    StB: Stream<E, B> + 'static,
    F: Fn(A) -> C + Send + Sync + 'static,
    G: Fn(B) -> C + Send + Sync + 'static,
{
    merge(a.map(f), b.map(g), capacity)
}

/// `merge`, tagging every element with which side it came from.
pub fn merge_either<E, A, B, StA, StB>(
    a: Arc<StA>,
    b: Arc<StB>,
    capacity: usize,
) -> Arc<Supervised<FromQueue<E, Either<A, B>>>>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    StA: Stream<E, A> + 'static,
    StB: Stream<E, B> + 'static,
{
    merge_with(a, b, capacity, Either::Left, Either::Right)
}

/// A stream backed by two producer queues, combined tick by tick by `f`.
/// Each tick reads one element from *each* queue, surfacing `None` once a
/// side has ended; `f` sees both sides as `Option`s and decides whether to
/// keep going (by returning `Some`, possibly padding for the ended side) or
/// end the combined stream (by returning `None`). Fails as soon as either
/// side fails.
pub struct JoinWith<E, A, B, C> {
    queue_a: Arc<Queue<Take<E, A>>>,
    queue_b: Arc<Queue<Take<E, B>>>,
    f: Arc<dyn Fn(Option<A>, Option<B>) -> Option<C> + Send + Sync>,
    _supervisor: Supervisor,
}

impl<E, A, B, C> Stream<E, C> for JoinWith<E, A, B, C>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, C, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        Box::pin(async move {
            let mut state = init;
            loop {
                let a = match self.queue_a.take().await {
                    None | Some(Take::End) => None,
                    Some(Take::Fail(e)) => return Err(e),
                    Some(Take::Value(a)) => Some(a),
                };
                let b = match self.queue_b.take().await {
                    None | Some(Take::End) => None,
                    Some(Take::Fail(e)) => return Err(e),
                    Some(Take::Value(b)) => Some(b),
                };
                match (self.f)(a, b) {
                    None => return Ok(Step::Cont(state)),
                    Some(c) => match step(state, c).await? {
                        Step::Cont(s) => state = s,
                        Step::Stop(s) => return Ok(Step::Stop(s)),
                    },
                }
            }
        })
    }
}

/// Run `a` and `b` concurrently, giving `f` control over which side to pull
/// past: each tick it sees `Option<A>`/`Option<B>` (`None` once that side
/// has ended) and returns `Some(c)` to keep combining or `None` to end the
/// stream. Strictly more general than `zip`/`zip_with`, which truncate at
/// the first `None`.
pub fn join_with<E, A, B, C, StA, StB, F>(
    a: Arc<StA>,
    b: Arc<StB>,
    capacity: usize,
    f: F,
) -> Arc<JoinWith<E, A, B, C>>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    StA: Stream<E, A> + 'static,
    StB: Stream<E, B> + 'static,
    F: Fn(Option<A>, Option<B>) -> Option<C> + Send + Sync + 'static,
{
    let (tx_a, queue_a) = Queue::bounded(capacity);
    let (tx_b, queue_b) = Queue::bounded(capacity);
    let mut supervisor = Supervisor::new();
    spawn_producer(a, tx_a, &mut supervisor);
    spawn_producer(b, tx_b, &mut supervisor);
    Arc::new(JoinWith {
        queue_a: Arc::new(queue_a),
        queue_b: Arc::new(queue_b),
        f: Arc::new(f),
        _supervisor: supervisor,
    })
}

/// `join_with` pairing elements up as plain tuples, truncating to the
/// shorter side.
pub fn zip<E, A, B, StA, StB>(
    a: Arc<StA>,
    b: Arc<StB>,
    capacity: usize,
) -> Arc<JoinWith<E, A, B, (A, B)>>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    StA: Stream<E, A> + 'static,
    StB: Stream<E, B> + 'static,
{
    join_with(a, b, capacity, |a, b| match (a, b) {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    })
}

/// `join_with` applying a combiner to each pair, truncating to the shorter
/// side.
pub fn zip_with<E, A, B, C, StA, StB, F>(
    a: Arc<StA>,
    b: Arc<StB>,
    capacity: usize,
    f: F,
) -> Arc<JoinWith<E, A, B, C>>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    StA: Stream<E, A> + 'static,
    StB: Stream<E, B> + 'static,
    F: Fn(A, B) -> C + Send + Sync + 'static,
{
    join_with(a, b, capacity, move |a, b| match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    })
}

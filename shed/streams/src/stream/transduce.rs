/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Drive a [`Sink`] against a stream (spec.md §4.5): [`run_sink`] runs it
//! once for a single result, [`transduce`] re-initializes it every time it
//! completes and turns the source into a stream of completions.

use super::{call_shared, share_step, FoldResult, Stream, StepFn};
use crate::chunk::Chunk;
use crate::sink::{Sink, SinkStep};
use crate::step::Step;
use std::sync::Arc;

/// Feed every element of `stream` into `sink`, one at a time, stopping
/// early the moment the sink says it is done. If the stream is exhausted
/// first, the sink is extracted from whatever state it reached.
pub async fn run_sink<E, A, B, St, Sk>(stream: Arc<St>, sink: Sk) -> Result<B, E>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    St: Stream<E, A> + 'static,
    Sk: Sink<E, A, B> + Send + Sync + 'static,
    Sk::State: Send + 'static,
{
    let sink = Arc::new(sink);
    let init = sink.initial();
    let sink_for_step = sink.clone();
    let step: StepFn<Sk::State, A, E> = Box::new(move |s, a| {
        let sink = sink_for_step.clone();
        Box::pin(async move {
            match sink.step_chunk(s, Chunk::single(a))? {
                SinkStep::Cont(s) => Ok(Step::Cont(s)),
                SinkStep::Done(s, _leftover) => Ok(Step::Stop(s)),
            }
        })
    });
    let final_state = stream.fold(init, step).await?.extract();
    sink.extract(final_state)
}

/// See [`transduce`].
pub struct Transduce<Up, Sk> {
    upstream: Arc<Up>,
    sink: Arc<Sk>,
}

impl<E, A, B, Up, Sk> Stream<E, B> for Transduce<Up, Sk>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    Up: Stream<E, A> + 'static,
    Sk: Sink<E, A, B> + Send + Sync + 'static,
    Sk::State: Send + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, step: StepFn<S, B, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let sink = self.sink.clone();
        let shared = share_step(step);
        let cycle = Arc::new(tokio::sync::Mutex::new(Some(sink.initial())));
        let upstream_step: StepFn<S, A, E> = Box::new(move |mut s, a| {
            let sink = sink.clone();
            let shared = shared.clone();
            let cycle = cycle.clone();
            Box::pin(async move {
                let mut cycle_guard = cycle.lock().await;
                let mut state = cycle_guard
                    .take()
                    .expect("transduce's sink cycle is reseeded before this closure returns");
                let mut pending = Chunk::single(a);
                loop {
                    match sink.step_chunk(state, pending)? {
                        SinkStep::Cont(next) => {
                            state = next;
                            break;
                        }
                        SinkStep::Done(done_state, leftover) => {
                            let b = sink.extract(done_state)?;
                            match call_shared(shared.clone(), s, b).await? {
                                Step::Cont(next_s) => s = next_s,
                                Step::Stop(next_s) => {
                                    *cycle_guard = Some(sink.initial());
                                    return Ok(Step::Stop(next_s));
                                }
                            }
                            state = sink.initial();
                            if leftover.is_empty() {
                                break;
                            }
                            pending = leftover;
                        }
                    }
                }
                *cycle_guard = Some(state);
                Ok(Step::Cont(s))
            })
        });
        self.upstream.clone().fold(init, upstream_step)
    }
}

/// Turn `sink` into a stream-to-stream combinator: feed `upstream`'s
/// elements into `sink`, and every time it completes, emit the result
/// downstream and re-initialize a fresh sink seeded with whatever elements
/// were left over in the chunk that finished it. Continues until
/// `upstream` is exhausted.
///
/// If `upstream` ends with the sink mid-way (not `Done`), that partial
/// state is discarded rather than flushed — see spec.md §9's open question
/// on a flushing variant.
pub fn transduce<E, A, B, Up, Sk>(upstream: Arc<Up>, sink: Sk) -> Arc<Transduce<Up, Sk>>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    Up: Stream<E, A> + 'static,
    Sk: Sink<E, A, B> + Send + Sync + 'static,
    Sk::State: Send + 'static,
{
    Arc::new(Transduce {
        upstream,
        sink: Arc::new(sink),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Chunks, CollectVec, Count};
    use crate::stream::constructors::from_iterable;
    use crate::stream::terminal::to_vec;

    #[tokio::test]
    async fn run_sink_collects_everything_when_the_sink_never_finishes_early() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]);
        let got = run_sink(s, CollectVec).await.unwrap();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn run_sink_counts_every_element() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4]);
        let got = run_sink(s, Count).await.unwrap();
        assert_eq!(got, 4);
    }

    #[tokio::test]
    async fn run_sink_stops_as_soon_as_the_sink_is_done() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4, 5]);
        let got = run_sink(s, Chunks::new(2)).await.unwrap();
        assert_eq!(got, vec![1, 2]);
    }

    #[tokio::test]
    async fn run_sink_extracts_a_partial_sink_if_upstream_runs_out_first() {
        let s = from_iterable::<String, _>(vec![1, 2]);
        let got = run_sink(s, Chunks::new(10)).await.unwrap();
        assert_eq!(got, vec![1, 2]);
    }

    #[tokio::test]
    async fn transduce_emits_one_chunk_per_n_elements() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4, 5, 6]);
        let chunked = transduce(s, Chunks::new(2));
        let got = to_vec::<String, _, _>(chunked).await.unwrap();
        assert_eq!(got, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    }

    #[tokio::test]
    async fn transduce_discards_a_partial_trailing_chunk() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4, 5]);
        let chunked = transduce(s, Chunks::new(2));
        let got = to_vec::<String, _, _>(chunked).await.unwrap();
        assert_eq!(got, vec![vec![1, 2], vec![3, 4]]);
    }

    #[tokio::test]
    async fn transduce_round_trip_property_n_times_k() {
        let n = 4usize;
        let k = 3usize;
        let xs: Vec<i32> = (0..(n * k) as i32).collect();
        let s = from_iterable::<String, _>(xs);
        let chunked = transduce(s, Chunks::new(k));
        let got = to_vec::<String, _, _>(chunked).await.unwrap();
        assert_eq!(got.len(), n);
        assert!(got.iter().all(|chunk| chunk.len() == k));
        assert_eq!(
            got.into_iter().flatten().collect::<Vec<_>>(),
            (0..(n * k) as i32).collect::<Vec<_>>()
        );
    }
}

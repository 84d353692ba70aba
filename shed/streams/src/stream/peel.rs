/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Split a stream into a sink-consumed prefix and the remaining tail
//! (spec.md §4.5): `peel(stream, sink)` drives `sink` against `stream`'s
//! elements and, the moment the sink is done, hands back its result
//! together with a `Stream` of whatever comes after.
//!
//! The tricky part is that a `Stream`'s `fold` is a single traversal: once
//! it returns there is no way to resume it from where it left off. So the
//! original stream is folded exactly once, in a background fiber, with
//! every element forwarded onto a queue; the sink is driven off that queue
//! in the foreground. The moment it reaches `Done`, whatever is left in
//! the chunk the sink handed back becomes the tail's first elements, and
//! the tail keeps draining the same queue the background fiber is still
//! feeding.

use super::concurrent::Supervised;
use super::dynstream::BoxStream;
use super::{FoldResult, Stream, StepFn};
use crate::chunk::Chunk;
use crate::rt::{Queue, Supervisor};
use crate::sink::Sink;
use crate::step::Step;
use crate::take::Take;
use std::sync::Arc;

struct LeftoverThenQueue<E, A> {
    leftover: tokio::sync::Mutex<Option<Chunk<A>>>,
    queue: Arc<Queue<Take<E, A>>>,
}

impl<E, A> Stream<E, A> for LeftoverThenQueue<E, A>
where
    E: Send + 'static,
    A: Send + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        Box::pin(async move {
            let mut state = init;
            let leftover = self.leftover.lock().await.take();
            if let Some(chunk) = leftover {
                for a in chunk {
                    match step(state, a).await? {
                        Step::Cont(s) => state = s,
                        Step::Stop(s) => return Ok(Step::Stop(s)),
                    }
                }
            }
            loop {
                match self.queue.take().await {
                    None | Some(Take::End) => return Ok(Step::Cont(state)),
                    Some(Take::Fail(e)) => return Err(e),
                    Some(Take::Value(a)) => match step(state, a).await? {
                        Step::Cont(s) => state = s,
                        Step::Stop(s) => return Ok(Step::Stop(s)),
                    },
                }
            }
        })
    }
}

/// Drive `sink` against `stream`'s elements. Returns the sink's result and
/// a stream of whatever elements the sink did not consume, lazily backed
/// by the rest of `stream`'s elements as they continue arriving.
///
/// If `stream` is exhausted before `sink` calls itself done, the sink is
/// extracted from whatever state it reached and the tail is the (already
/// known to be) empty stream.
pub async fn peel<E, A, B, St, Sk>(
    stream: Arc<St>,
    sink: Sk,
    capacity: usize,
) -> Result<(B, BoxStream<E, A>), E>
where
    E: Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    St: Stream<E, A> + 'static,
    Sk: Sink<E, A, B> + Send + Sync + 'static,
{
    let sink = Arc::new(sink);
    let (tx, queue) = Queue::bounded(capacity);
    let queue = Arc::new(queue);
    let mut supervisor = Supervisor::new();
    super::concurrent::spawn_producer(stream, tx, &mut supervisor);

    let mut sink_state = sink.initial();
    loop {
        match queue.take().await {
            None | Some(Take::End) => {
                let result = sink.extract(sink_state)?;
                let tail = LeftoverThenQueue {
                    leftover: tokio::sync::Mutex::new(None),
                    queue: queue.clone(),
                };
                let tail = Arc::new(Supervised::new(Arc::new(tail), supervisor));
                return Ok((result, BoxStream::from_arc(tail)));
            }
            Some(Take::Fail(e)) => return Err(e),
            Some(Take::Value(a)) => match sink.step_chunk(sink_state, Chunk::single(a))? {
                crate::sink::SinkStep::Cont(s) => sink_state = s,
                crate::sink::SinkStep::Done(s, leftover) => {
                    let result = sink.extract(s)?;
                    let tail = LeftoverThenQueue {
                        leftover: tokio::sync::Mutex::new(Some(leftover)),
                        queue: queue.clone(),
                    };
                    let tail = Arc::new(Supervised::new(Arc::new(tail), supervisor));
                    return Ok((result, BoxStream::from_arc(tail)));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::Chunks;
    use crate::stream::constructors::from_iterable;
    use crate::stream::terminal::to_vec;

    #[tokio::test]
    async fn peel_splits_the_sink_prefix_from_the_tail() {
        let s = from_iterable::<String, _>(vec![1, 2, 3, 4, 5]);
        let (head, tail) = peel(s, Chunks::new(2), 8).await.unwrap();
        assert_eq!(head, vec![1, 2]);
        assert_eq!(to_vec(Arc::new(tail)).await.unwrap(), vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn peel_extracts_whatever_the_sink_has_if_upstream_runs_out_first() {
        let s = from_iterable::<String, _>(vec![1, 2]);
        let (head, tail) = peel(s, Chunks::new(10), 8).await.unwrap();
        assert_eq!(head, vec![1, 2]);
        assert_eq!(to_vec(Arc::new(tail)).await.unwrap(), Vec::<i32>::new());
    }
}

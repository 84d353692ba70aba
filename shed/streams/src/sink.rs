/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! An incremental consumer: initial state, a step that may finish early
//! with leftovers, and an extraction into the final result.

use crate::chunk::Chunk;

/// The result of feeding one chunk into a [`Sink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkStep<S, A0> {
    /// The sink wants more input; carries its updated state.
    Cont(S),
    /// The sink is done; carries its final state and any unconsumed
    /// elements from the chunk it was just given.
    Done(S, Chunk<A0>),
}

impl<S, A0> SinkStep<S, A0> {
    /// True if the sink wants more input.
    pub fn is_cont(&self) -> bool {
        matches!(self, SinkStep::Cont(_))
    }
}

/// An incremental consumer of elements of type `A0`, producing a `B` once
/// it decides it is done.
///
/// `step` is chunk-at-a-time so a single sink can both be driven
/// element-by-element (`transduce` feeds one-element chunks) and handed a
/// whole upstream remainder at once (`peel` replays its leftover chunk in
/// one call).
pub trait Sink<E, A0, B>: Send {
    /// Per-sink state threaded between `step` calls.
    type State: Send;

    /// The state to start from.
    fn initial(&self) -> Self::State;

    /// Feed one chunk of input, advancing `state`.
    fn step_chunk(
        &self,
        state: Self::State,
        chunk: Chunk<A0>,
    ) -> Result<SinkStep<Self::State, A0>, E>;

    /// Produce the final result from a `Done` state.
    fn extract(&self, state: Self::State) -> Result<B, E>;
}

/// A sink that collects every element into a `Vec`, never finishing early.
pub struct CollectVec;

impl<E, A: Send> Sink<E, A, Vec<A>> for CollectVec {
    type State = Vec<A>;

    fn initial(&self) -> Vec<A> {
        Vec::new()
    }

    fn step_chunk(&self, mut state: Vec<A>, chunk: Chunk<A>) -> Result<SinkStep<Vec<A>, A>, E> {
        state.extend(chunk.into_vec());
        Ok(SinkStep::Cont(state))
    }

    fn extract(&self, state: Vec<A>) -> Result<Vec<A>, E> {
        Ok(state)
    }
}

/// A sink that counts the elements it has seen, never finishing early.
pub struct Count;

impl<E, A: Send> Sink<E, A, usize> for Count {
    type State = usize;

    fn initial(&self) -> usize {
        0
    }

    fn step_chunk(&self, state: usize, chunk: Chunk<A>) -> Result<SinkStep<usize, A>, E> {
        Ok(SinkStep::Cont(state + chunk.len()))
    }

    fn extract(&self, state: usize) -> Result<usize, E> {
        Ok(state)
    }
}

/// A sink that pure-folds every element with `f`, never finishing early.
pub struct Fold<S, F> {
    zero: S,
    f: F,
}

impl<S, F> Fold<S, F> {
    /// Fold starting from `zero`, combining each element with `f`.
    pub fn new(zero: S, f: F) -> Self {
        Fold { zero, f }
    }
}

impl<E, A, S, F> Sink<E, A, S> for Fold<S, F>
where
    A: Send,
    S: Clone + Send,
    F: Fn(S, A) -> S + Send + Sync,
{
    type State = S;

    fn initial(&self) -> S {
        self.zero.clone()
    }

    fn step_chunk(&self, state: S, chunk: Chunk<A>) -> Result<SinkStep<S, A>, E> {
        let next = chunk.into_iter().fold(state, |acc, a| (self.f)(acc, a));
        Ok(SinkStep::Cont(next))
    }

    fn extract(&self, state: S) -> Result<S, E> {
        Ok(state)
    }
}

/// A sink that completes as soon as it has accumulated `n` elements,
/// returning them as a `Vec` and leaving any extra elements as leftovers.
pub struct Chunks {
    n: usize,
}

impl Chunks {
    /// Complete once `n` elements have been accumulated.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "Chunks sink size must be positive");
        Chunks { n }
    }
}

impl<E, A: Send> Sink<E, A, Vec<A>> for Chunks {
    type State = Vec<A>;

    fn initial(&self) -> Vec<A> {
        Vec::with_capacity(self.n)
    }

    fn step_chunk(
        &self,
        mut state: Vec<A>,
        chunk: Chunk<A>,
    ) -> Result<SinkStep<Vec<A>, A>, E> {
        let mut items = chunk.into_vec().into_iter();
        while state.len() < self.n {
            match items.next() {
                Some(a) => state.push(a),
                None => return Ok(SinkStep::Cont(state)),
            }
        }
        let leftover: Chunk<A> = items.collect();
        Ok(SinkStep::Done(state, leftover))
    }

    fn extract(&self, state: Vec<A>) -> Result<Vec<A>, E> {
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_vec_accumulates_everything() {
        let sink = CollectVec;
        let state: Result<SinkStep<Vec<i32>, i32>, ()> =
            sink.step_chunk(sink.initial(), Chunk::from_vec(vec![1, 2, 3]));
        let SinkStep::Cont(state) = state.unwrap() else {
            panic!("collect never finishes early");
        };
        assert_eq!(sink.extract(state).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn chunks_completes_at_n_and_returns_leftovers() {
        let sink = Chunks::new(2);
        let r: Result<SinkStep<Vec<i32>, i32>, ()> =
            sink.step_chunk(sink.initial(), Chunk::from_vec(vec![1, 2, 3]));
        match r.unwrap() {
            SinkStep::Done(state, leftover) => {
                assert_eq!(state, vec![1, 2]);
                assert_eq!(leftover.into_vec(), vec![3]);
            }
            SinkStep::Cont(_) => panic!("expected Done at n=2"),
        }
    }

    #[test]
    fn chunks_keeps_accumulating_below_n() {
        let sink = Chunks::new(3);
        let r: Result<SinkStep<Vec<i32>, i32>, ()> =
            sink.step_chunk(sink.initial(), Chunk::from_vec(vec![1]));
        match r.unwrap() {
            SinkStep::Cont(state) => assert_eq!(state, vec![1]),
            SinkStep::Done(..) => panic!("should not be done yet"),
        }
    }
}

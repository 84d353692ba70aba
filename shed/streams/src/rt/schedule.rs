/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A recurrence/decision driver for `Stream::repeat` and
//! `Stream::repeat_elems`.
//!
//! Reshaped from the retry-loop policies in
//! `shed/futures_retry/src/backoff.rs` (fixed interval, exponential,
//! Fibonacci, jitter) into the spec's `update(input, state, clock) ->
//! Decision` contract: a `Schedule` does not itself loop, it is *consulted*
//! once per iteration by the combinator driving it.

use super::Clock;
use std::time::Duration;

/// What a [`Schedule`] decided for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<S> {
    /// Run again after `delay`, carrying `state` into the next `update`.
    Continue { delay: Duration, state: S },
    /// Stop recurring.
    Stop,
}

/// A recurrence policy, consulted once per iteration of `repeat`/
/// `repeat_elems`.
///
/// `In` is `()` for `repeat` (the schedule only sees that one full pass of
/// the stream completed) and the element type `A` for `repeat_elems` (the
/// schedule sees each emitted element and decides whether, and after how
/// long, to re-emit it).
pub trait Schedule<In>: Send + Sync {
    /// Per-run state threaded between calls to `update`.
    type State: Send + Clone;

    /// The state to start from.
    fn initial(&self) -> Self::State;

    /// Decide whether to continue, and after what delay, given the latest
    /// input and the schedule's own state. `clock` is provided so schedules
    /// that care about wall-clock deadlines (not just elapsed intervals)
    /// can consult it.
    fn update(&self, input: &In, state: Self::State, clock: &dyn Clock) -> Decision<Self::State>;
}

/// Always continue, after a fixed delay.
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    /// A schedule that repeats forever with a fixed delay between runs.
    pub fn new(interval: Duration) -> Self {
        FixedInterval { interval }
    }
}

impl<In> Schedule<In> for FixedInterval {
    type State = ();

    fn initial(&self) -> Self::State {}

    fn update(&self, _input: &In, _state: (), _clock: &dyn Clock) -> Decision<()> {
        Decision::Continue {
            delay: self.interval,
            state: (),
        }
    }
}

/// Continue up to `max` times total, with no delay, then stop. Corresponds
/// to the common "repeat N times" policy.
pub struct Recurs {
    max: usize,
}

impl Recurs {
    /// Stop after `max` completed iterations.
    pub fn new(max: usize) -> Self {
        Recurs { max }
    }
}

impl<In> Schedule<In> for Recurs {
    /// Number of iterations already completed.
    type State = usize;

    fn initial(&self) -> usize {
        0
    }

    fn update(&self, _input: &In, state: usize, _clock: &dyn Clock) -> Decision<usize> {
        if state < self.max {
            Decision::Continue {
                delay: Duration::ZERO,
                state: state + 1,
            }
        } else {
            Decision::Stop
        }
    }
}

/// Binary exponential backoff, optionally capped by `max_interval`.
pub struct ExponentialBackoff {
    base: f64,
    initial: Duration,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Doubling backoff starting at `initial`.
    pub fn binary(initial: Duration) -> Self {
        ExponentialBackoff {
            base: 2.0,
            initial,
            max_interval: None,
        }
    }

    /// Backoff starting at `initial`, multiplying by `base` each iteration.
    pub fn new(initial: Duration, base: f64) -> Self {
        ExponentialBackoff {
            base,
            initial,
            max_interval: None,
        }
    }

    /// Cap every delay this schedule decides on at `max`.
    pub fn max_interval(mut self, max: Duration) -> Self {
        self.max_interval = Some(max);
        self
    }
}

impl<In> Schedule<In> for ExponentialBackoff {
    /// The delay that was last used; `None` before the first iteration.
    type State = Option<Duration>;

    fn initial(&self) -> Self::State {
        None
    }

    fn update(&self, _input: &In, state: Self::State, _clock: &dyn Clock) -> Decision<Self::State> {
        let next = match state {
            None => self.initial,
            Some(prev) => prev.mul_f64(self.base),
        };
        let next = match self.max_interval {
            Some(max) => next.min(max),
            None => next,
        };
        Decision::Continue {
            delay: next,
            state: Some(next),
        }
    }
}

/// Fibonacci backoff: each delay is the sum of the previous two.
pub struct FibonacciBackoff {
    initial: Duration,
}

impl FibonacciBackoff {
    /// A Fibonacci backoff whose first two delays are both `initial`.
    pub fn new(initial: Duration) -> Self {
        FibonacciBackoff { initial }
    }
}

impl<In> Schedule<In> for FibonacciBackoff {
    type State = (Duration, Duration);

    fn initial(&self) -> Self::State {
        (self.initial, self.initial)
    }

    fn update(
        &self,
        _input: &In,
        (current, next): Self::State,
        _clock: &dyn Clock,
    ) -> Decision<Self::State> {
        Decision::Continue {
            delay: current,
            state: (next, current + next),
        }
    }
}

/// Wrap another schedule, adding uniform random jitter in `[0, jitter)` to
/// every delay it decides on.
pub struct Jittered<S> {
    inner: S,
    jitter: Duration,
}

impl<S> Jittered<S> {
    /// Add up to `jitter` of uniform random delay on top of `inner`.
    pub fn new(inner: S, jitter: Duration) -> Self {
        Jittered { inner, jitter }
    }
}

impl<In, S: Schedule<In>> Schedule<In> for Jittered<S> {
    type State = S::State;

    fn initial(&self) -> Self::State {
        self.inner.initial()
    }

    fn update(&self, input: &In, state: Self::State, clock: &dyn Clock) -> Decision<Self::State> {
        match self.inner.update(input, state, clock) {
            Decision::Stop => Decision::Stop,
            Decision::Continue { delay, state } => Decision::Continue {
                delay: delay + self.jitter.mul_f64(rand::random::<f64>()),
                state,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rt::SystemClock;

    #[test]
    fn recurs_stops_after_max() {
        let s = Recurs::new(2);
        let clock = SystemClock;
        let st = s.initial();
        let d1 = Schedule::<()>::update(&s, &(), st, &clock);
        let st = match d1 {
            Decision::Continue { state, .. } => state,
            Decision::Stop => panic!("expected continue"),
        };
        let d2 = Schedule::<()>::update(&s, &(), st, &clock);
        let st = match d2 {
            Decision::Continue { state, .. } => state,
            Decision::Stop => panic!("expected continue"),
        };
        let d3 = Schedule::<()>::update(&s, &(), st, &clock);
        assert_eq!(d3, Decision::Stop);
    }

    #[test]
    fn exponential_backoff_doubles() {
        let s = ExponentialBackoff::binary(Duration::from_millis(100));
        let clock = SystemClock;
        let st = s.initial();
        let d1 = Schedule::<()>::update(&s, &(), st, &clock);
        let (delay1, st) = match d1 {
            Decision::Continue { delay, state } => (delay, state),
            Decision::Stop => panic!(),
        };
        assert_eq!(delay1, Duration::from_millis(100));
        let d2 = Schedule::<()>::update(&s, &(), st, &clock);
        let delay2 = match d2 {
            Decision::Continue { delay, .. } => delay,
            Decision::Stop => panic!(),
        };
        assert_eq!(delay2, Duration::from_millis(200));
    }

    #[test]
    fn fibonacci_backoff_sums_previous_two() {
        let s = FibonacciBackoff::new(Duration::from_millis(100));
        let clock = SystemClock;
        let mut state = s.initial();
        let mut delays = vec![];
        for _ in 0..5 {
            match Schedule::<()>::update(&s, &(), state, &clock) {
                Decision::Continue { delay, state: next } => {
                    delays.push(delay);
                    state = next;
                }
                Decision::Stop => panic!(),
            }
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(300),
                Duration::from_millis(500),
            ]
        );
    }
}

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Ways to run a stream to completion: `fold`/`foldLeft` live on [`Stream`]
//! itself (spec.md §4.1); everything here is built on top of those.

use super::Stream;
use crate::step::Step;
use std::sync::Arc;

/// Run `stream` purely for its side effects, discarding every element.
pub async fn run<E, A, St>(stream: Arc<St>) -> Result<(), E>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    stream
        .fold((), Box::new(|(), _a| Box::pin(async { Ok(Step::Cont(())) })))
        .await
        .map(Step::extract)
}

/// Run `effect` for every element, suspending between elements on whatever
/// `effect` itself suspends on.
pub async fn foreach<E, A, St, F, Fut>(stream: Arc<St>, effect: F) -> Result<(), E>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), E>> + Send + 'static,
{
    let effect = Arc::new(effect);
    let step: super::StepFn<(), A, E> = Box::new(move |(), a| {
        let effect = effect.clone();
        Box::pin(async move {
            effect(a).await?;
            Ok(Step::Cont(()))
        })
    });
    stream.fold((), step).await.map(Step::extract)
}

/// `foreach` for a pure, non-failing callback that can ask the fold to stop
/// early by returning `false` ("continue" otherwise).
pub async fn foreach0<E, A, St, F>(stream: Arc<St>, mut effect: F) -> Result<(), E>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
    F: FnMut(A) -> bool + Send + 'static,
{
    let step: super::StepFn<(), A, E> = Box::new(move |(), a| {
        let keep_going = effect(a);
        Box::pin(async move {
            if keep_going {
                Ok(Step::Cont(()))
            } else {
                Ok(Step::Stop(()))
            }
        })
    });
    stream.fold((), step).await.map(Step::extract)
}

/// Collect every element into a `Vec`, in emission order.
///
/// Takes the [`Stream::try_fold_pure`] fast path when the source is also
/// [`super::StreamPure`] (`from_iterable`, `range`, `unfold`), skipping the
/// async machinery entirely.
pub async fn to_vec<E, A, St>(stream: Arc<St>) -> Result<Vec<A>, E>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    let mut push = |mut acc: Vec<A>, a: A| {
        acc.push(a);
        Step::Cont(acc)
    };
    if let Some(step) = stream.try_fold_pure(Vec::new(), &mut push) {
        return Ok(step.extract());
    }
    let combine: Arc<dyn Fn(Vec<A>, A) -> Vec<A> + Send + Sync> = Arc::new(|mut acc, a| {
        acc.push(a);
        acc
    });
    stream.fold_left(Vec::new(), combine).await
}

/// Run `stream` and return whether it produced at least one element,
/// stopping as soon as it has an answer.
pub async fn is_empty<E, A, St>(stream: Arc<St>) -> Result<bool, E>
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    let step: super::StepFn<bool, A, E> =
        Box::new(|_found, _a| Box::pin(async { Ok(Step::Stop(true)) }));
    let found = stream.fold(false, step).await.map(Step::extract)?;
    Ok(!found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::constructors::from_iterable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn to_vec_preserves_order() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]);
        assert_eq!(to_vec(s).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn foreach_runs_the_effect_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s = from_iterable::<String, _>(vec![1, 2, 3]);
        let acc = seen.clone();
        foreach(s, move |a| {
            let acc = acc.clone();
            async move {
                acc.lock().unwrap().push(a);
                Ok(())
            }
        })
        .await
        .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn foreach0_is_the_pure_variant() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let s = from_iterable::<String, _>(vec![1, 2, 3]);
        foreach0::<String, _, _, _>(s, move |_a| {
            c.fetch_add(1, Ordering::SeqCst);
            true
        })
        .await
        .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn foreach0_stops_early_once_the_callback_says_so() {
        let sum = Arc::new(AtomicUsize::new(0));
        let s = sum.clone();
        let stream = from_iterable::<String, _>(vec![1, 1, 1, 1, 1, 1]);
        foreach0::<String, _, _, _>(stream, move |a: i32| {
            let total = s.fetch_add(a as usize, Ordering::SeqCst) + a as usize;
            total < 3
        })
        .await
        .unwrap();
        assert_eq!(sum.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_drains_without_collecting() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]);
        run::<String, _, _>(s).await.unwrap();
    }

    #[tokio::test]
    async fn is_empty_true_for_the_empty_stream() {
        let s = from_iterable::<String, i32>(Vec::new());
        assert!(is_empty(s).await.unwrap());
    }

    #[tokio::test]
    async fn is_empty_stops_after_the_first_element() {
        let s = from_iterable::<String, _>(vec![1, 2, 3]);
        assert!(!is_empty(s).await.unwrap());
    }
}

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! End-to-end checks of the properties the fold protocol is supposed to
//! guarantee, independent of any one combinator's own unit tests.

use std::sync::Arc;

use quickcheck_macros::quickcheck;
use streams::{from_iterable, merge, peel, range, to_vec, transduce, zip, Chunks, StreamExt};

/// `to_vec` on an unmodified source just replays what went in.
#[quickcheck]
fn fold_identity_replays_the_source(xs: Vec<i32>) -> bool {
    let s = from_iterable::<String, _>(xs.clone());
    let got = tokio_test_block_on(to_vec::<String, _, _>(s)).unwrap();
    got == xs
}

/// `from_iterable(xs).to_vec_pure()` and the effectful `to_vec` agree,
/// exercising the `try_fold_pure` fast path against the ordinary `fold` path
/// on the same underlying data.
#[quickcheck]
fn pure_and_effectful_folds_agree(xs: Vec<i32>) -> bool {
    use streams::StreamPure;
    let s = from_iterable::<String, _>(xs.clone());
    let pure = s.to_vec_pure();
    let effectful = tokio_test_block_on(to_vec::<String, _, _>(s)).unwrap();
    pure == effectful && pure == xs
}

/// `map(f).map(g)` and `map(|a| g(f(a)))` produce the same elements.
#[quickcheck]
fn map_fusion_agrees_with_a_single_composed_map(xs: Vec<i32>) -> bool {
    let fused = from_iterable::<String, _>(xs.clone()).map(|n: i32| (n * 2) + 1);
    let composed = from_iterable::<String, _>(xs).map(|n: i32| n * 2).map(|n| n + 1);
    let fused = tokio_test_block_on(to_vec::<String, _, _>(fused)).unwrap();
    let composed = tokio_test_block_on(to_vec::<String, _, _>(composed)).unwrap();
    fused == composed
}

/// Filtering then mapping, and mapping then filtering on the mapped
/// predicate, commute when the predicate is pulled through the map.
#[quickcheck]
fn filter_commutes_with_map_under_the_pulled_back_predicate(xs: Vec<i32>) -> bool {
    let filter_then_map = from_iterable::<String, _>(xs.clone())
        .filter(|n: &i32| n % 2 == 0)
        .map(|n| n * 10);
    let map_then_filter = from_iterable::<String, _>(xs)
        .map(|n: i32| n * 10)
        .filter(|n: &i32| (n / 10) % 2 == 0);
    let a = tokio_test_block_on(to_vec::<String, _, _>(filter_then_map)).unwrap();
    let b = tokio_test_block_on(to_vec::<String, _, _>(map_then_filter)).unwrap();
    a == b
}

/// `take(n)` followed by `drop(n)` on the same source, concatenated, is the
/// identity for `n <= len`.
#[quickcheck]
fn take_and_drop_are_complementary(xs: Vec<i32>, n: usize) -> bool {
    let head = from_iterable::<String, _>(xs.clone()).take(n);
    let tail = from_iterable::<String, _>(xs.clone()).drop(n);
    let mut got = tokio_test_block_on(to_vec::<String, _, _>(head)).unwrap();
    got.extend(tokio_test_block_on(to_vec::<String, _, _>(tail)).unwrap());
    got == xs
}

#[tokio::test]
async fn zip_with_index_numbers_elements_from_zero() -> anyhow::Result<()> {
    let s = from_iterable::<String, _>(vec!["a", "b", "c"]).zip_with_index();
    let got = to_vec(s).await.map_err(anyhow::Error::msg)?;
    assert_eq!(got, vec![("a", 0), ("b", 1), ("c", 2)]);
    Ok(())
}

#[tokio::test]
async fn early_exit_stops_the_producer_from_emitting_further_elements() -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let seen = Arc::new(AtomicUsize::new(0));
    let s = seen.clone();
    let stream = range::<String>(0, 1_000_000).with_effect(move |_n| {
        let s = s.clone();
        async move {
            s.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    let head = stream.take(3);
    let got = to_vec(head).await.map_err(anyhow::Error::msg)?;
    assert_eq!(got, vec![0, 1, 2]);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn bracket_releases_even_when_the_consumer_stops_early() -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use streams::bracket;

    let released = Arc::new(AtomicBool::new(false));
    let r = released.clone();
    let stream = bracket::<String, _, _, _, _, _, _, _, _>(
        || async { Ok::<_, String>(()) },
        move |_| {
            let r = r.clone();
            async move {
                r.store(true, Ordering::SeqCst);
            }
        },
        |_| range::<String>(0, 1_000_000),
    );
    let got = to_vec(stream.take(2)).await.map_err(anyhow::Error::msg)?;
    assert_eq!(got, vec![0, 1]);
    assert!(released.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn merge_is_complete_even_when_one_side_is_slower() -> anyhow::Result<()> {
    let fast = from_iterable::<String, _>(vec![1, 2, 3]);
    let slow = from_iterable::<String, _>(vec![10, 20]);
    let merged = merge(fast, slow, 4);
    let mut got = to_vec(merged).await.map_err(anyhow::Error::msg)?;
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3, 10, 20]);
    Ok(())
}

#[tokio::test]
async fn zip_truncates_to_the_shorter_side() -> anyhow::Result<()> {
    let a = from_iterable::<String, _>(vec![1, 2, 3, 4]);
    let b = from_iterable::<String, _>(vec!["x", "y"]);
    let zipped = zip(a, b, 4);
    let got = to_vec(zipped).await.map_err(anyhow::Error::msg)?;
    assert_eq!(got, vec![(1, "x"), (2, "y")]);
    Ok(())
}

/// Testable property #12 (spec.md §8): a stream of `n*k` elements
/// transduced through a sink that accumulates `k` elements emits exactly
/// `n` lists, each of length `k`, in order.
#[tokio::test]
async fn transduce_round_trips_through_a_chunks_sink() -> anyhow::Result<()> {
    let s = from_iterable::<String, _>(vec![1, 2, 3, 4, 5, 6]);
    let chunked = transduce(s, Chunks::new(3));
    let got = to_vec(chunked).await.map_err(anyhow::Error::msg)?;
    assert_eq!(got, vec![vec![1, 2, 3], vec![4, 5, 6]]);
    Ok(())
}

#[tokio::test]
async fn peel_hands_back_a_usable_tail_stream() -> anyhow::Result<()> {
    let s = from_iterable::<String, _>(vec![1, 2, 3, 4, 5]);
    let (head, tail) = peel(s, Chunks::new(2), 8).await.map_err(anyhow::Error::msg)?;
    assert_eq!(head, vec![1, 2]);
    let rest = to_vec(Arc::new(tail)).await.map_err(anyhow::Error::msg)?;
    assert_eq!(rest, vec![3, 4, 5]);
    Ok(())
}

/// `quickcheck`'s async support doesn't extend to `#[quickcheck]` functions,
/// so the purely-synchronous properties above drive the async runtime by
/// hand with a fresh current-thread executor per check.
fn tokio_test_block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build a current-thread runtime")
        .block_on(fut)
}

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Boxing heterogeneous streams behind one concrete type.
//!
//! `concat`, `flatMap`, `peel`'s tail and the sources fed to `merge`/`zip`/
//! `joinWith` all need to hold streams of possibly different concrete types
//! side by side. `Stream::fold` being generic in its carrier `S` rules out
//! the usual `Arc<dyn Stream<E, A>>` (a generic method makes a trait
//! non-object-safe), so `BoxStream` instead always instantiates the
//! underlying stream's `fold` at one fixed, erased carrier type
//! (`Box<dyn Any + Send>`) and lets the real caller's `S` travel inside
//! that box. The erasure is invisible from the outside: `BoxStream`
//! implements `Stream` like anything else.

use super::{FoldResult, Stream, StepFn};
use std::any::Any;
use std::sync::Arc;

type AnyBox = Box<dyn Any + Send>;
type AnyStepFn<A, E> = StepFn<AnyBox, A, E>;

/// The object-safe counterpart of [`Stream`]: `fold` instantiated once,
/// at `S = AnyBox`, which every `Stream` implementor already supports
/// since `fold` is generic over any `S: Send + 'static`.
trait ErasedStream<E, A>: Send + Sync
where
    E: Send + 'static,
    A: Send + 'static,
{
    fn fold_erased(self: Arc<Self>, init: AnyBox, step: AnyStepFn<A, E>) -> FoldResult<AnyBox, E>;
}

impl<E, A, St> ErasedStream<E, A> for St
where
    E: Send + 'static,
    A: Send + 'static,
    St: Stream<E, A> + 'static,
{
    fn fold_erased(self: Arc<Self>, init: AnyBox, step: AnyStepFn<A, E>) -> FoldResult<AnyBox, E> {
        self.fold(init, step)
    }
}

/// A stream whose concrete implementation has been erased, so that values
/// of different concrete stream types can be stored together (a `Vec` of
/// merge sources, the two sides of `concat`, a `flatMap` closure's result).
pub struct BoxStream<E, A> {
    inner: Arc<dyn ErasedStream<E, A>>,
}

impl<E, A> Clone for BoxStream<E, A> {
    fn clone(&self) -> Self {
        BoxStream {
            inner: self.inner.clone(),
        }
    }
}

impl<E, A> BoxStream<E, A>
where
    E: Send + 'static,
    A: Send + 'static,
{
    /// Box up any concrete stream, erasing its type.
    pub fn new<St>(stream: St) -> Self
    where
        St: Stream<E, A> + 'static,
    {
        BoxStream {
            inner: Arc::new(stream),
        }
    }

    /// Box up a stream already held behind an `Arc`.
    pub fn from_arc<St>(stream: Arc<St>) -> Self
    where
        St: Stream<E, A> + 'static,
    {
        BoxStream { inner: stream }
    }
}

impl<E, A> Stream<E, A> for BoxStream<E, A>
where
    E: Send + 'static,
    A: Send + 'static,
{
    fn fold<S>(self: Arc<Self>, init: S, mut step: StepFn<S, A, E>) -> FoldResult<S, E>
    where
        S: Send + 'static,
    {
        let erased_init: AnyBox = Box::new(init);
        let erased_step: AnyStepFn<A, E> = Box::new(move |boxed, a| {
            let s: S = *boxed
                .downcast::<S>()
                .expect("BoxStream carrier type mismatch");
            let fut = step(s, a);
            Box::pin(async move {
                let st = fut.await?;
                Ok(st.map(|s| Box::new(s) as AnyBox))
            })
        });
        let inner = self.inner.clone();
        Box::pin(async move {
            let result = inner.fold_erased(erased_init, erased_step).await?;
            Ok(result.map(|boxed| {
                *boxed
                    .downcast::<S>()
                    .expect("BoxStream carrier type mismatch")
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::constructors::from_iterable;
    use crate::stream::terminal::to_vec;

    #[tokio::test]
    async fn box_stream_round_trips_elements() {
        let s: BoxStream<String, i32> = BoxStream::from_arc(from_iterable(vec![1, 2, 3]));
        let v = to_vec(Arc::new(s)).await.unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }
}

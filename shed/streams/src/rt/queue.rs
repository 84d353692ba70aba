/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A bounded asynchronous FIFO queue.
//!
//! Backed by [`tokio::sync::mpsc`]. `offer` suspends while the queue is
//! full; `take` suspends while it is empty.
//!
//! ## The `End.forever` idiom
//!
//! A producer fiber feeding a [`crate::Take`] queue for one of the
//! concurrent combinators (see `stream::concurrent::spawn_producer`) never
//! has to send `Take::End` itself at all: once its source is exhausted it
//! simply returns, dropping its `QueueSender`. `take` already behaves as
//! if `End` were posted forever after that point, because a `tokio::mpsc`
//! channel whose last sender has been dropped makes every subsequent
//! `recv()` return `None` — the same answer every time, not just once —
//! so callers that key off `take().await == None` see exactly the
//! "End, then End again no matter how many more times you ask" behaviour
//! the fold protocol wants, for free.
/// A bounded multi-producer, single-consumer async queue.
pub struct Queue<A> {
    tx: tokio::sync::mpsc::Sender<A>,
    rx: tokio::sync::Mutex<tokio::sync::mpsc::Receiver<A>>,
}

/// The sending half of a [`Queue`], cheaply cloneable.
#[derive(Clone)]
pub struct QueueSender<A> {
    tx: tokio::sync::mpsc::Sender<A>,
}

impl<A: Send + 'static> Queue<A> {
    /// Create a new bounded queue with the given capacity.
    ///
    /// A `capacity` of zero is rounded up to one: a zero-capacity channel
    /// would make every `offer` block until a concurrent `take`, which is
    /// never what a stream combinator wants (the minimum useful pacing is
    /// "one element may be in flight").
    pub fn bounded(capacity: usize) -> (QueueSender<A>, Self) {
        let (tx, rx) = tokio::sync::mpsc::channel(capacity.max(1));
        (
            QueueSender { tx: tx.clone() },
            Queue {
                tx,
                rx: tokio::sync::Mutex::new(rx),
            },
        )
    }

    /// Suspend until an element is available, or return `None` once every
    /// sender has been dropped and the queue is drained.
    pub async fn take(&self) -> Option<A> {
        self.rx.lock().await.recv().await
    }

    /// A sender handle that can be cloned and moved into a producer fiber.
    pub fn sender(&self) -> QueueSender<A> {
        QueueSender {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Send + 'static> QueueSender<A> {
    /// Suspend until there is room in the queue, then enqueue `a`.
    ///
    /// Fails only if every receiver has been dropped (the scope that owns
    /// the queue has already been torn down).
    pub async fn offer(&self, a: A) -> Result<(), A> {
        self.tx.send(a).await.map_err(|e| e.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offer_then_take_preserves_order() {
        let (tx, q) = Queue::bounded(4);
        tx.offer(1).await.unwrap();
        tx.offer(2).await.unwrap();
        assert_eq!(q.take().await, Some(1));
        assert_eq!(q.take().await, Some(2));
    }

    #[tokio::test]
    async fn take_returns_none_after_senders_dropped() {
        let (tx, q) = Queue::bounded(4);
        tx.offer(1).await.unwrap();
        drop(tx);
        assert_eq!(q.take().await, Some(1));
        assert_eq!(q.take().await, None);
        assert_eq!(q.take().await, None);
    }

    #[tokio::test]
    async fn offer_suspends_when_full() {
        let (tx, q) = Queue::bounded(1);
        tx.offer(1).await.unwrap();
        let tx2 = tx.clone();
        let handle = tokio::spawn(async move { tx2.offer(2).await });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        assert_eq!(q.take().await, Some(1));
        handle.await.unwrap().unwrap();
        assert_eq!(q.take().await, Some(2));
    }
}

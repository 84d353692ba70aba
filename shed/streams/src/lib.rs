/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

#![deny(warnings, missing_docs, clippy::all, broken_intra_doc_links)]

//! An effectful, pull-based stream combinator library.
//!
//! A [`Stream`] answers a single question, over and over: "given a seed and
//! a step function, fold yourself." Every combinator — `map`, `filter`,
//! `concat`, `merge`, `zip`, `peel`, `transduce` and the rest — is built by
//! composing that one primitive rather than by exposing a poll loop, which
//! is what makes resource safety (`bracket`), concurrency (`merge`/`zip`)
//! and sink-driven parsing (`peel`/`transduce`) all compose with each other
//! instead of needing separate escape hatches.
//!
//! Start from a constructor in [`stream::constructors`] (`from_iterable`,
//! `unfold`, `bracket`, ...), reach for [`StreamExt`] for `map`/`filter`/
//! `take`/`scan`/..., [`stream::concurrent`] for `merge`/`zip`/`join_with`,
//! and a function in [`stream::terminal`] (`to_vec`, `foreach`, `run`) to
//! actually run the thing.

/// A finite batch of elements, the unit sinks consume at a time.
pub mod chunk;
/// The effect runtime the stream protocol is built on.
pub mod rt;
/// Sinks: the consumer side of `peel`/`transduce`.
pub mod sink;
/// What a fold step decides: keep going, or stop.
pub mod step;
/// The `Stream` trait and every combinator built on it.
pub mod stream;
/// The per-element protocol used internally by the concurrent combinators.
pub mod take;

pub use crate::chunk::Chunk;
pub use crate::sink::{Chunks, Sink, SinkStep};
pub use crate::step::Step;
pub use crate::stream::combinators::{flatten, StreamExt};
pub use crate::stream::concurrent::{
    join_with, merge, merge_either, merge_with, to_queue, zip, zip_with, Either, JoinWith,
};
pub use crate::stream::constructors::{
    bracket, empty, from_chunk, from_iterable, from_queue, lift, managed, point, range, unfold,
    unfold_m, unwrap,
};
pub use crate::stream::peel::peel;
pub use crate::stream::terminal::{foreach, foreach0, is_empty, run, to_vec};
pub use crate::stream::transduce::{run_sink, transduce};
pub use crate::stream::{BoxStream, Stream, StreamPure};
pub use crate::take::Take;

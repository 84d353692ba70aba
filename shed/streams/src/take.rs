/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Per-element outcome envelope used to shuttle values through queues.
//!
//! Producer fibers in the concurrent combinators translate a source stream
//! into a sequence of `Take`s: a `Value` per element, at most one `Fail` if
//! the source errors, and then `End` repeated forever. See the
//! `End.forever` idiom documented on [`crate::rt::queue`].

/// A single outcome read off a producer queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Take<E, A> {
    /// One produced element.
    Value(A),
    /// The source failed; no further elements will follow.
    Fail(E),
    /// The source is exhausted.
    End,
}

impl<E, A> Take<E, A> {
    /// Map the element type, leaving `Fail`/`End` untouched.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Take<E, B> {
        match self {
            Take::Value(a) => Take::Value(f(a)),
            Take::Fail(e) => Take::Fail(e),
            Take::End => Take::End,
        }
    }

    /// True if this is `End`.
    pub fn is_end(&self) -> bool {
        matches!(self, Take::End)
    }
}

/// Translate a `Take`-producing effect into `Result<Option<A>, E>`:
/// `End -> Ok(None)`, `Value(a) -> Ok(Some(a))`, `Fail(e) -> Err(e)`.
///
/// This is the usual way downstream code turns the three-case envelope back
/// into the two-case shape (`Option` for presence, `Result` for failure)
/// that the rest of the fold protocol expects.
pub async fn option<E, A, F>(take: F) -> Result<Option<A>, E>
where
    F: std::future::Future<Output = Take<E, A>>,
{
    match take.await {
        Take::Value(a) => Ok(Some(a)),
        Take::Fail(e) => Err(e),
        Take::End => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn option_translates_value() {
        let r: Result<Option<u32>, &str> = option(async { Take::Value(5u32) }).await;
        assert_eq!(r, Ok(Some(5)));
    }

    #[tokio::test]
    async fn option_translates_end() {
        let r: Result<Option<u32>, &str> = option(async { Take::<&str, u32>::End }).await;
        assert_eq!(r, Ok(None));
    }

    #[tokio::test]
    async fn option_translates_fail() {
        let r: Result<Option<u32>, &str> = option(async { Take::<&str, u32>::Fail("boom") }).await;
        assert_eq!(r, Err("boom"));
    }

    #[test]
    fn map_only_touches_value() {
        let v: Take<&str, u32> = Take::Value(1);
        assert_eq!(v.map(|x| x + 1), Take::Value(2));
        let f: Take<&str, u32> = Take::Fail("e");
        assert_eq!(f.map(|x| x + 1), Take::Fail("e"));
        let e: Take<&str, u32> = Take::End;
        assert_eq!(e.map(|x| x + 1), Take::End);
    }
}

/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A cloneable wrapper around an error, for fanning one failure out to
//! several observers (e.g. a [`crate::rt::Promise`] awaited by more than one
//! fiber).

use std::fmt;
use std::sync::Arc;

/// A cloneable handle to a single error value.
///
/// The underlying error is stored once in an `Arc` and shared; cloning a
/// `SharedError` never clones the error itself.
#[derive(Clone)]
pub struct SharedError<E> {
    inner: Arc<E>,
}

impl<E> SharedError<E> {
    /// Wrap an error for sharing.
    pub fn new(error: E) -> Self {
        SharedError {
            inner: Arc::new(error),
        }
    }

    /// Borrow the underlying error.
    pub fn get(&self) -> &E {
        &self.inner
    }
}

impl<E> From<E> for SharedError<E> {
    fn from(error: E) -> Self {
        SharedError::new(error)
    }
}

impl<E: fmt::Debug> fmt::Debug for SharedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl<E: fmt::Display> fmt::Display for SharedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for SharedError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_same_error() {
        let e = SharedError::new("boom".to_string());
        let e2 = e.clone();
        assert_eq!(e.get(), e2.get());
        assert!(Arc::ptr_eq(&e.inner, &e2.inner));
    }
}

//! Error types for the writer engine.
//!
//! The only expected, recoverable condition is an unreachable position:
//! the row a [`Position`](crate::position::Position) resolves to has
//! scrolled outside the addressable buffer, or (for viewport-constrained
//! writes) outside the visible window. The `try_` write variants swallow
//! exactly these two variants and return `None`; device errors always
//! propagate unchanged.

use std::io;
use thiserror::Error;

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The resolved row lies outside `[0, buffer_height)`.
    #[error("position resolves outside the addressable buffer (row {row})")]
    OutOfBuffer {
        /// The unclamped row the position resolved to.
        row: i64,
    },

    /// The resolved row is buffered but outside the visible window.
    #[error("position resolves outside the visible window (row {row})")]
    OutOfViewport {
        /// The row the position resolved to.
        row: i64,
    },

    /// A failure from the underlying terminal device, passed through.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the recoverable out-of-range conditions that the `try_`
    /// write variants swallow.
    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfBuffer { .. } | Error::OutOfViewport { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

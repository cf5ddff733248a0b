//! Errors at the edges of the scanner API.
//!
//! The scan loop itself never raises: per spec §7 it returns `false` to
//! mean "no token matched", and the host contract's `deserialize`
//! tolerates a truncated buffer by resetting rather than failing. The
//! types here exist for the stricter, opt-in entry points this crate
//! adds on top of that contract (see [`crate::scanner::Scanner::try_deserialize`]).

use thiserror::Error;

/// Why [`crate::scanner::Scanner::try_deserialize`] rejected a buffer.
///
/// The host-facing [`crate::scanner::Scanner::deserialize`] never
/// surfaces this type: it always falls back to a fresh scanner on any
/// malformed input, per spec §4.4. This type is for callers (chiefly
/// this crate's own tests) that want to know *why* a buffer did not
/// round-trip.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The buffer ended before the fixed-size header (7 bytes) was read.
    #[error("buffer too short for the scanner state header: got {len} bytes, need at least 7")]
    HeaderTruncated { len: usize },

    /// The header declared a `context_stack.size` that could not possibly
    /// fit given the remaining bytes.
    #[error("buffer truncated inside the context stack: declared {declared} entries, only {available} bytes remain")]
    ContextStackTruncated { declared: usize, available: usize },

    /// The header declared a `heredocs.size` that could not possibly fit
    /// given the remaining bytes.
    #[error("buffer truncated inside the heredoc queue")]
    HeredocQueueTruncated,

    /// A heredoc's declared `delimiter.size` ran past the end of the
    /// buffer.
    #[error("heredoc delimiter length {declared} exceeds the {available} bytes remaining in the buffer")]
    HeredocDelimiterTruncated { declared: usize, available: usize },

    /// A byte that should have been `0` or `1` (a boolean field) had
    /// some other value.
    #[error("expected a boolean byte (0 or 1), found {found}")]
    InvalidBoolean { found: u8 },

    /// A context tag byte did not correspond to any [`crate::context::Context`] variant.
    #[error("unrecognized context tag byte {found}")]
    InvalidContextTag { found: u8 },
}

//! Codec error types.

use std::io;

/// Errors raised while building a request frame.
///
/// These happen before any network I/O and are never worth retrying.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// A field contained non-ASCII characters.
    #[error("field `{field}` is not ASCII")]
    NotAscii {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field or the whole frame does not fit a `u32` length prefix.
    #[error("field `{field}` exceeds u32::MAX bytes")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Errors raised while reading a response.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The stream ended before a declared field or line was complete.
    #[error("response truncated while reading {what}")]
    Truncated {
        /// What was being read when the stream ran out.
        what: &'static str,
    },

    /// A message line declared a length above [`crate::MAX_LINE`].
    #[error("message line of {0} bytes exceeds limit")]
    LineTooLong(u32),

    /// A message line contained non-ASCII bytes.
    #[error("message line {0} is not ASCII")]
    NotAscii(u32),

    /// The underlying stream failed.
    #[error(transparent)]
    Io(io::Error),
}

impl DecodeError {
    /// Maps a read failure, turning EOF into [`DecodeError::Truncated`].
    pub(crate) fn from_io(err: io::Error, what: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated { what }
        } else {
            Self::Io(err)
        }
    }
}

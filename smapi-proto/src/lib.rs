//! Wire protocol for the z/VM SMAPI socket interface.
//!
//! A request is a single length-prefixed frame carrying the API name,
//! credentials, target and command text. The server answers in two parts:
//! a bare 4-byte request number, then a body holding the return code,
//! reason code and a list of length-prefixed message lines. All integers
//! are big-endian `u32` and all text is ASCII.
//!
//! The codec works over any [`std::io::Read`] / [`std::io::Write`], so the
//! same functions drive a TLS stream or a captured byte slice.

mod codec;
mod error;
mod message;

pub use codec::{
    HEADER_LEN, MAX_LINE, encode, read_body, read_request_number, read_response, write_response,
};
pub use error::{DecodeError, EncodeError};
pub use message::{MessageLine, Request, Response};

//! Length-prefixed frame codec over any `Read`/`Write` stream.
//!
//! Request frame:
//!
//! ```text
//! [u32 total][u32 len][api_name][u32 len][auth_user]
//!            [u32 len][auth_pass][u32 len][target][command_text]
//! ```
//!
//! Response: `[u32 request_number]` followed by
//! `[u32 total][u32 request_number][u32 rc][u32 rs][u32 count]` and `count`
//! lines of `[u32 len][text]`.

use std::io::{self, Read, Write};

use zeroize::Zeroizing;

use crate::{DecodeError, EncodeError, MessageLine, Request, Response};

/// Size of the fixed response body header (five `u32` fields).
pub const HEADER_LEN: usize = 20;

/// Maximum accepted length of a single message line (16 MiB).
pub const MAX_LINE: u32 = 16 * 1024 * 1024;

/// Encodes `req` into a complete request frame.
///
/// The returned buffer contains the password in clear text and is wiped
/// when dropped. Do not log it.
pub fn encode(req: &Request) -> Result<Zeroizing<Vec<u8>>, EncodeError> {
    let fields: [(&'static str, &str); 4] = [
        ("api_name", &req.api_name),
        ("auth_user", &req.auth_user),
        ("auth_pass", req.auth_pass.as_str()),
        ("target", &req.target),
    ];

    for (field, value) in fields {
        if !value.is_ascii() {
            return Err(EncodeError::NotAscii { field });
        }
    }
    if !req.command_text.is_ascii() {
        return Err(EncodeError::NotAscii {
            field: "command_text",
        });
    }

    // Sized up front so the buffer never reallocates and leaves a stale
    // copy of the password behind.
    let capacity = 4
        + fields.iter().map(|(_, v)| 4 + v.len()).sum::<usize>()
        + req.command_text.len();
    let mut frame = Zeroizing::new(Vec::with_capacity(capacity));
    frame.extend_from_slice(&[0; 4]);

    for (field, value) in fields {
        let len = u32::try_from(value.len()).map_err(|_| EncodeError::TooLong { field })?;
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(value.as_bytes());
    }
    frame.extend_from_slice(req.command_text.as_bytes());

    let total =
        u32::try_from(frame.len() - 4).map_err(|_| EncodeError::TooLong { field: "frame" })?;
    frame[..4].copy_from_slice(&total.to_be_bytes());
    Ok(frame)
}

/// Reads the bare request number that precedes the response body.
pub fn read_request_number(r: &mut impl Read) -> Result<u32, DecodeError> {
    read_u32(r, "request number")
}

/// Reads the response body: fixed header, then message lines.
///
/// Line parsing stops after `message_count` lines or at the first line
/// with a declared length of zero. [`Response::echo`] is left at zero.
pub fn read_body(r: &mut impl Read) -> Result<Response, DecodeError> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header)
        .map_err(|e| DecodeError::from_io(e, "response header"))?;
    let word =
        |i: usize| u32::from_be_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);

    let message_count = word(16);
    let mut lines = Vec::new();
    for index in 0..message_count {
        let len = read_u32(r, "message line length")?;
        if len == 0 {
            break;
        }
        if len > MAX_LINE {
            return Err(DecodeError::LineTooLong(len));
        }
        let mut buf = vec![0u8; len as usize];
        r.read_exact(&mut buf)
            .map_err(|e| DecodeError::from_io(e, "message line"))?;
        if !buf.is_ascii() {
            return Err(DecodeError::NotAscii(index));
        }
        let text = String::from_utf8(buf).map_err(|_| DecodeError::NotAscii(index))?;
        lines.push(MessageLine(text));
    }

    Ok(Response {
        echo: 0,
        total_length: word(0),
        request_number: word(4),
        return_code: word(8),
        reason_code: word(12),
        message_count,
        lines,
    })
}

/// Reads a complete two-part response.
///
/// Every field is read with `read_exact`, so a response split across
/// many transport reads decodes the same as one delivered at once.
pub fn read_response(r: &mut impl Read) -> Result<Response, DecodeError> {
    let echo = read_request_number(r)?;
    let mut resp = read_body(r)?;
    resp.echo = echo;
    Ok(resp)
}

/// Writes `resp` in server wire format.
///
/// Header fields are written verbatim; see [`Response::new`] for a
/// constructor that fills in consistent lengths. Used by server stubs.
pub fn write_response<W: Write>(w: &mut W, resp: &Response) -> io::Result<()> {
    w.write_all(&resp.echo.to_be_bytes())?;
    for word in [
        resp.total_length,
        resp.request_number,
        resp.return_code,
        resp.reason_code,
        resp.message_count,
    ] {
        w.write_all(&word.to_be_bytes())?;
    }
    for line in &resp.lines {
        let len = u32::try_from(line.0.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "line exceeds u32::MAX"))?;
        w.write_all(&len.to_be_bytes())?;
        w.write_all(line.0.as_bytes())?;
    }
    w.flush()
}

/// Reads one big-endian `u32`.
fn read_u32(r: &mut impl Read, what: &'static str) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| DecodeError::from_io(e, what))?;
    Ok(u32::from_be_bytes(buf))
}

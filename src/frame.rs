// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;

use bytes::{Buf, Bytes};
use itertools::Itertools;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

/// Bulk payloads and arrays announced with this length are the RESP2 nulls.
const NULL_LENGTH: i64 = -1;

/// Deepest array nesting accepted from a peer. Requests are flat arrays, so anything near this is
/// hostile or broken.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame type byte '{}'", char::from(*.0))]
    InvalidType(u8),
    #[error("invalid {kind} length {length}")]
    InvalidLength { kind: &'static str, length: i64 },
    #[error("invalid integer in frame header")]
    InvalidInteger,
    #[error("invalid utf-8 in simple frame")]
    InvalidUtf8,
    #[error("bulk payload is not terminated by CRLF")]
    MissingTerminator,
    #[error("arrays nested deeper than {0} levels")]
    TooDeep(usize),
}

/// A RESP2 value, used both for client requests (arrays of bulk strings) and replies.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    /// The RESP2 null bulk string, `$-1`.
    Null,
    /// The RESP2 null array, `*-1`.
    NullArray,
    Array(Vec<Frame>),
}

impl Frame {
    /// Parses one frame from `src`. Returns [`Error::Incomplete`] when the buffer ends before the
    /// frame does, so the caller can wait for more bytes and retry from the same position.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Self::parse_at(src, 0)
    }

    fn parse_at(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Self, Error> {
        if !src.has_remaining() {
            return Err(Error::Incomplete);
        }

        match src.get_u8() {
            b'+' => Ok(Frame::Simple(read_text(src)?)),
            b'-' => Ok(Frame::Error(read_text(src)?)),
            b':' => Ok(Frame::Integer(read_integer(src)?)),
            b'$' => match read_integer(src)? {
                NULL_LENGTH => Ok(Frame::Null),
                length => {
                    let length = to_length("bulk", length)?;
                    let data = read_payload(src, length)?;
                    Ok(Frame::Bulk(Bytes::copy_from_slice(data)))
                }
            },
            b'*' => match read_integer(src)? {
                NULL_LENGTH => Ok(Frame::NullArray),
                _ if depth >= MAX_DEPTH => Err(Error::TooDeep(MAX_DEPTH)),
                length => {
                    let length = to_length("array", length)?;
                    // Never trust a client supplied length for preallocation.
                    let mut frames = Vec::with_capacity(length.min(1024));
                    for _ in 0..length {
                        frames.push(Self::parse_at(src, depth + 1)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            byte => Err(Error::InvalidType(byte)),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => write_line(out, b'+', s.as_bytes()),
            Frame::Error(s) => write_line(out, b'-', s.as_bytes()),
            Frame::Integer(i) => write_line(out, b':', i.to_string().as_bytes()),
            Frame::Bulk(data) => {
                write_line(out, b'$', data.len().to_string().as_bytes());
                out.extend_from_slice(data);
                out.extend_from_slice(CRLF);
            }
            Frame::Null => out.extend_from_slice(b"$-1\r\n"),
            Frame::NullArray => out.extend_from_slice(b"*-1\r\n"),
            Frame::Array(frames) => {
                write_line(out, b'*', frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.write_to(out);
                }
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::NullArray => write!(f, "*-1"),
            Frame::Array(arr) => write!(f, "*{}[{}]", arr.len(), arr.iter().join(", ")),
        }
    }
}

fn write_line(out: &mut Vec<u8>, prefix: u8, content: &[u8]) {
    out.push(prefix);
    out.extend_from_slice(content);
    out.extend_from_slice(CRLF);
}

/// Reads up to the next CRLF and moves the cursor past it.
fn read_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let buf: &'a [u8] = *src.get_ref();
    let start = src.position() as usize;

    let end = buf[start..]
        .windows(CRLF.len())
        .position(|window| window == CRLF)
        .map(|offset| start + offset)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

fn read_text(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    let line = read_line(src)?;
    String::from_utf8(line.to_vec()).map_err(|_| Error::InvalidUtf8)
}

fn read_integer(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = read_line(src)?;
    std::str::from_utf8(line)
        .ok()
        .and_then(|line| line.parse::<i64>().ok())
        .ok_or(Error::InvalidInteger)
}

fn to_length(kind: &'static str, length: i64) -> Result<usize, Error> {
    usize::try_from(length).map_err(|_| Error::InvalidLength { kind, length })
}

fn read_payload<'a>(src: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8], Error> {
    let buf: &'a [u8] = *src.get_ref();
    let start = src.position() as usize;
    let end = start.checked_add(length).ok_or(Error::InvalidLength {
        kind: "bulk",
        length: length as i64,
    })?;

    if buf.len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &buf[end..end + CRLF.len()] != CRLF {
        return Err(Error::MissingTerminator);
    }

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

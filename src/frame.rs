// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Buf;
use bytes::Bytes;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

// Literal length used by both bulk strings and arrays to signal a null value.
static NULL_LENGTH: &[u8; 2] = b"-1";

/// Deepest array nesting accepted from a peer. The top level array is depth 1.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("received empty invalid message")]
    Empty,
    #[error("unsupported message discriminator")]
    InvalidDataType(u8),
    /// Invalid message encoding.
    #[error("{0}")]
    Other(crate::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    /// Parses a single frame starting at the cursor position. On success the cursor is left right
    /// after the last byte of the frame, on error its position is unspecified.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Self::parse_nested(src, 0)
    }

    fn parse_nested(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Self, Error> {
        // A frame needs at least a discriminator and something after it.
        if src.remaining() <= 1 {
            return Err(Error::Empty);
        }

        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = src.get_u8();
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let bytes = get_line(src)?.to_vec();
                let string = String::from_utf8(bytes)?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => {
                let line = get_line(src)?;
                let integer = parse_decimal::<i64>(line)?;

                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let line = get_line(src)?;
                if line == NULL_LENGTH {
                    return Ok(Frame::Null);
                }

                let length = parse_decimal::<usize>(line)?;
                let data = get_exact(src, length)?;

                Ok(Frame::Bulk(Bytes::copy_from_slice(data)))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let line = get_line(src)?;
                if line == NULL_LENGTH {
                    return Ok(Frame::Null);
                }

                let length = parse_decimal::<usize>(line)?;

                if depth >= MAX_DEPTH {
                    return Err("protocol error; nesting too deep".into());
                }

                // Every element takes at least three bytes, don't trust the header for the
                // allocation size.
                let mut frames = Vec::with_capacity(length.min(src.remaining() / 3));
                for _ in 0..length {
                    let frame = Self::parse_nested(src, depth + 1)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
        }
    }

    /// Decodes one frame from `buf` starting at `offset`, returning the number of bytes the frame
    /// spans together with the frame itself. Nothing is considered consumed on error.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(usize, Frame), Error> {
        let mut cursor = Cursor::new(buf);
        cursor.set_position(offset as u64);

        let frame = Self::parse(&mut cursor)?;
        let consumed = cursor.position() as usize - offset;

        Ok((consumed, frame))
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => serialize_line(DataType::SimpleString, s),
            Frame::Error(s) => serialize_line(DataType::SimpleError, s),
            Frame::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(bytes) => {
                let length_str = bytes.len().to_string();
                let mut result = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + bytes.len() + CRLF.len(),
                );
                result.push(u8::from(DataType::BulkString));
                result.extend_from_slice(length_str.as_bytes());
                result.extend_from_slice(CRLF);
                result.extend_from_slice(bytes);
                result.extend_from_slice(CRLF);
                result
            }
            // RESP2 has two null encodings, replies always use the bulk one.
            Frame::Null => {
                let mut bytes = Vec::with_capacity(1 + NULL_LENGTH.len() + CRLF.len());
                bytes.push(u8::from(DataType::BulkString));
                bytes.extend_from_slice(NULL_LENGTH);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Array(arr) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in arr {
                    bytes.extend(frame.serialize());
                }
                bytes
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
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Simple strings and errors can't carry line breaks, they are replaced by spaces so the text
/// always stays a single frame.
fn serialize_line(data_type: DataType, s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
    bytes.push(u8::from(data_type));
    bytes.extend(s.bytes().map(|byte| match byte {
        b'\r' | b'\n' => b' ',
        byte => byte,
    }));
    bytes.extend_from_slice(CRLF);
    bytes
}

/// Returns the bytes between the cursor and the next CRLF, leaving the cursor past the CRLF.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let line_end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&buf[start..line_end])
}

/// Returns exactly `length` bytes followed by a CRLF terminator, leaving the cursor past it.
fn get_exact<'a>(src: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let data_end = start
        .checked_add(length)
        .ok_or_else(|| Error::from("protocol error; invalid bulk length"))?;

    if buf.len() < data_end.saturating_add(CRLF.len()) {
        return Err(Error::Incomplete);
    }

    if &buf[data_end..data_end + CRLF.len()] != CRLF {
        return Err("protocol error; bulk data is not terminated by CRLF".into());
    }

    src.set_position((data_end + CRLF.len()) as u64);

    Ok(&buf[start..data_end])
}

fn parse_decimal<T: std::str::FromStr>(line: &[u8]) -> Result<T, Error> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| {
            format!(
                "protocol error; invalid number {:?}",
                String::from_utf8_lossy(line)
            )
            .into()
        })
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    BulkString,   // '$'
    SimpleError,  // '-'
    Integer,      // ':'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Other(src.into())
    }
}

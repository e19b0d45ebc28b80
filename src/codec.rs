use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::MAX_DEPTH;
use crate::Error;

/// Splits the inbound byte stream into chunks holding one or more complete requests.
///
/// Requests are not decoded into frames here. The codec only finds where the last complete
/// request in the buffer ends so the chunk can be handed over to the handler in one piece,
/// which keeps pipelined requests together.
///
/// The scan resumes where the previous call stopped, so a request trickling in over many reads
/// is only walked through once.
pub struct PipelineCodec {
    max_frame_size: usize,
    /// Buffer offset the scan has reached.
    scanned: usize,
    /// Buffer offset right after the last complete request.
    complete: usize,
    /// Elements still expected by every array the scan is inside of, innermost last.
    open: Vec<usize>,
}

enum Step {
    /// A whole element, spanning that many bytes.
    Element(usize),
    /// An array header spanning that many bytes, followed by the number of elements.
    Array(usize, usize),
    /// More data is needed.
    Wait,
    /// The data can't be a valid request.
    Malformed,
}

impl PipelineCodec {
    pub fn new(max_frame_size: usize) -> PipelineCodec {
        PipelineCodec {
            max_frame_size,
            scanned: 0,
            complete: 0,
            open: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.complete = 0;
        self.open.clear();
    }

    /// Walks the buffer from where the last call stopped, recording request boundaries. Returns
    /// `false` when the data is malformed.
    fn scan(&mut self, src: &[u8]) -> bool {
        loop {
            match step(&src[self.scanned..]) {
                Step::Wait => return true,
                Step::Malformed => return false,
                Step::Array(..) if self.open.len() >= MAX_DEPTH => return false,
                Step::Array(len, 0) => self.scanned += len,
                Step::Array(len, elements) => {
                    self.scanned += len;
                    self.open.push(elements);
                    continue;
                }
                Step::Element(len) => self.scanned += len,
            }

            // An element ended, which may close the arrays around it.
            loop {
                match self.open.last_mut() {
                    Some(remaining) => {
                        *remaining -= 1;
                        if *remaining > 0 {
                            break;
                        }
                        self.open.pop();
                    }
                    None => {
                        self.complete = self.scanned;
                        break;
                    }
                }
            }
        }
    }
}

/// Looks at the element starting at the beginning of `src`, without descending into arrays.
fn step(src: &[u8]) -> Step {
    // A discriminator alone can't be told apart from the start of a longer element.
    if src.len() <= 1 {
        return Step::Wait;
    }

    let (line, header_len) = match src[1..].windows(2).position(|window| window == b"\r\n") {
        Some(index) => (&src[1..1 + index], 1 + index + 2),
        None => return Step::Wait,
    };

    match src[0] {
        b'+' | b'-' | b':' => Step::Element(header_len),
        b'$' | b'*' if line == b"-1" => Step::Element(header_len),
        b'$' => match parse_length(line) {
            Some(length) => match header_len.checked_add(length).and_then(|n| n.checked_add(2)) {
                Some(total) if src.len() >= total => Step::Element(total),
                Some(_) => Step::Wait,
                None => Step::Malformed,
            },
            None => Step::Malformed,
        },
        b'*' => match parse_length(line) {
            Some(elements) => Step::Array(header_len, elements),
            None => Step::Malformed,
        },
        _ => Step::Malformed,
    }
}

fn parse_length(line: &[u8]) -> Option<usize> {
    std::str::from_utf8(line).ok()?.parse().ok()
}

impl Decoder for PipelineCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Bound the buffered data so a peer can't grow it forever with a never ending request.
        if src.len() > self.max_frame_size {
            return Err("frame size exceeds limit".into());
        }

        // Garbage never becomes valid with more data, let the handler answer it.
        if !self.scan(&src[..]) {
            self.reset();
            return Ok(Some(src.split().freeze()));
        }

        if self.complete == 0 {
            return Ok(None);
        }

        let chunk = src.split_to(self.complete).freeze();
        self.scanned -= self.complete;
        self.complete = 0;

        Ok(Some(chunk))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(chunk) => Ok(Some(chunk)),
            None if src.is_empty() => Ok(None),
            // The peer is gone half way through a request, answer whatever is left.
            None => {
                self.reset();
                Ok(Some(src.split().freeze()))
            }
        }
    }
}

impl Encoder<Bytes> for PipelineCodec {
    type Error = Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

//! Frame encoding and incremental decoding.
//!
//! Reads from a TCP stream can split one frame across several calls or
//! coalesce several frames into one. [`FrameDecoder`] accumulates bytes and
//! only yields a frame once it is complete.

use crate::{LEGACY_READ_BUFFER, MAX_FRAME_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame exceeds {max} bytes without a terminator ({len} buffered)")]
    FrameTooLong { len: usize, max: usize },
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    #[error("unknown framing mode: {0}")]
    UnknownFraming(String),
}

/// How frame boundaries are found on the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Framing {
    /// Every frame ends with `\n` (a preceding `\r` is tolerated).
    #[default]
    Newline,
    /// No terminator; each read of up to 36 bytes is taken as one frame.
    Legacy,
}

impl Framing {
    /// Size of the buffer handed to each `read` call.
    pub fn read_buffer_size(self) -> usize {
        match self {
            Framing::Newline => 1024,
            Framing::Legacy => LEGACY_READ_BUFFER,
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Newline => f.write_str("newline"),
            Framing::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for Framing {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newline" => Ok(Framing::Newline),
            "legacy" => Ok(Framing::Legacy),
            other => Err(CodecError::UnknownFraming(other.to_string())),
        }
    }
}

/// Encodes one message into the bytes written to the stream.
pub fn encode_frame(message: &str, framing: Framing) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(message.len() + 1);
    bytes.extend_from_slice(message.as_bytes());
    if framing == Framing::Newline {
        bytes.push(b'\n');
    }
    bytes
}

/// Accumulates raw reads and splits them into frames.
#[derive(Debug)]
pub struct FrameDecoder {
    framing: Framing,
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::new(),
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Appends the bytes of one read call.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes held back waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the next complete frame, if any.
    ///
    /// A frame that is not valid UTF-8 is consumed and reported as
    /// [`CodecError::InvalidUtf8`]; the decoder stays usable. An oversized
    /// unterminated frame is reported as [`CodecError::FrameTooLong`] and the
    /// stream should be abandoned.
    pub fn next_frame(&mut self) -> Result<Option<String>, CodecError> {
        match self.framing {
            Framing::Newline => self.next_line(),
            Framing::Legacy => {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let chunk = std::mem::take(&mut self.buffer);
                String::from_utf8(chunk)
                    .map(Some)
                    .map_err(|_| CodecError::InvalidUtf8)
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, CodecError> {
        loop {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_FRAME_LEN {
                    return Err(CodecError::FrameTooLong {
                        len: self.buffer.len(),
                        max: MAX_FRAME_LEN,
                    });
                }
                return Ok(None);
            };

            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.len() > MAX_FRAME_LEN {
                return Err(CodecError::FrameTooLong {
                    len: line.len(),
                    max: MAX_FRAME_LEN,
                });
            }
            // Blank keep-alive lines carry nothing.
            if line.is_empty() {
                continue;
            }

            return String::from_utf8(line)
                .map(Some)
                .map_err(|_| CodecError::InvalidUtf8);
        }
    }
}

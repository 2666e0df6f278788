//! Char-level and token-level cursors
//!
//! Every stage of a chain is a cursor wrapping the cursor beneath it:
//!
//! ```text
//! ReaderCharStream -> char filter -> ... -> tokenizer -> token filter -> ...
//!     CharStream        CharStream            TokenStream     TokenStream
//! ```
//!
//! Cursors are pulled one item at a time, so a chain only buffers what its
//! stages need for their current item. Dropping the outermost cursor drops
//! the whole chain, including the reader at the bottom.
//!
//! Once a cursor has returned `Ok(None)` it keeps returning `Ok(None)`.

use crate::analysis::error::StreamError;
use crate::analysis::token::Token;
use std::io::{self, BufRead};

/// A pull-based source of chars.
pub trait CharStream: Send {
    fn next_char(&mut self) -> Result<Option<char>, StreamError>;
}

/// A pull-based source of tokens.
pub trait TokenStream: Send {
    fn advance(&mut self) -> Result<Option<Token>, StreamError>;
}

pub type BoxCharStream = Box<dyn CharStream>;
pub type BoxTokenStream = Box<dyn TokenStream>;

/// Decodes UTF-8 from a buffered byte reader, one char per pull.
pub struct ReaderCharStream<R> {
    reader: R,
    offset: u64,
}

impl<R: BufRead + Send> ReaderCharStream<R> {
    pub fn new(reader: R) -> Self {
        ReaderCharStream { reader, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_byte(&mut self) -> Result<Option<u8>, StreamError> {
        loop {
            let byte = match self.reader.fill_buf() {
                Ok(available) => available.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if byte.is_some() {
                self.reader.consume(1);
                self.offset += 1;
            }
            return Ok(byte);
        }
    }
}

impl<R: BufRead + Send> CharStream for ReaderCharStream<R> {
    fn next_char(&mut self) -> Result<Option<char>, StreamError> {
        let start = self.offset;
        let malformed = |message: &str| StreamError::MalformedInput {
            offset: start,
            message: message.to_string(),
        };

        let Some(lead) = self.read_byte()? else {
            return Ok(None);
        };
        let width = utf8_width(lead).ok_or_else(|| malformed("invalid UTF-8 lead byte"))?;

        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self
                .read_byte()?
                .ok_or_else(|| malformed("truncated UTF-8 sequence"))?;
        }

        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or_else(|| malformed("invalid UTF-8 sequence"))
    }
}

fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Append chars up to and including the next `\n` to `line`.
///
/// Returns `false` when the stream was already exhausted.
pub fn read_line(input: &mut dyn CharStream, line: &mut String) -> Result<bool, StreamError> {
    let mut read_any = false;
    while let Some(c) = input.next_char()? {
        read_any = true;
        line.push(c);
        if c == '\n' {
            break;
        }
    }
    Ok(read_any)
}

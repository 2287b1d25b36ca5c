//! Bounded line reading for the REPL
use std::io::{self, BufRead, Read};

/// Longest accepted input line, in bytes, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 4096;

/// Result of one attempt to read a line.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A full line with its terminator stripped
    Line(String),
    /// The line was longer than the reader accepts
    Truncated,
    /// End of input
    Eof,
    /// Any other read failure, including invalid UTF-8
    Error(io::Error),
}

/// Source of raw input lines for the REPL.
pub trait LineSource {
    fn read_line(&mut self) -> ReadOutcome;

    /// The length limit reported when a line is truncated
    fn max_len(&self) -> usize {
        MAX_LINE_LEN
    }
}

/// Reads lines of at most `max_len` bytes from a buffered reader.
pub struct LineReader<R> {
    inner: R,
    max_len: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_len(inner, MAX_LINE_LEN)
    }

    pub fn with_max_len(inner: R, max_len: usize) -> Self {
        LineReader { inner, max_len }
    }
}

impl<R: BufRead> LineSource for LineReader<R> {
    fn read_line(&mut self) -> ReadOutcome {
        let mut buf = Vec::new();
        // Room for the longest line plus "\r\n".
        let budget = self.max_len as u64 + 2;
        match self.inner.by_ref().take(budget).read_until(b'\n', &mut buf) {
            Ok(0) => return ReadOutcome::Eof,
            Ok(_) => {}
            Err(e) => return ReadOutcome::Error(e),
        }

        let terminated = buf.last() == Some(&b'\n');
        if terminated {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > self.max_len {
            return ReadOutcome::Truncated;
        }
        match String::from_utf8(buf) {
            Ok(line) => ReadOutcome::Line(line),
            Err(e) => ReadOutcome::Error(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }

    fn max_len(&self) -> usize {
        self.max_len
    }
}

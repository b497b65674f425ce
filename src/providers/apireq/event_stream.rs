//! This module parses a stream of events from an HTTP response. Each event is a
//! single line of the form `data: <json>`, and the stream is terminated by the
//! sentinel payload `[DONE]`. It expects a byte stream, as produced by the
//! [`reqwest::Response::bytes_stream`] method, which can be incrementally parsed,
//! event by event.
//!
//! The parser is lenient: lines without the `data: ` prefix are ignored, and
//! payloads which fail to deserialize are dropped. Only a failure of the
//! underlying stream (or a response that overflows the buffer) is an error.

use bytes::Bytes;
use core::fmt;
use futures_core::stream::Stream;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::marker::Unpin;

const DATA_PREFIX: &[u8] = b"data: ";
const SENTINEL: &[u8] = b"[DONE]";

trait RemoveFirstN {
    fn remove_first(&mut self, n: usize);
}

impl<T: std::marker::Copy> RemoveFirstN for Vec<T> {
    fn remove_first(&mut self, n: usize) {
        self.copy_within(n.., 0);
        self.truncate(self.len() - n);
    }
}

#[derive(Debug)]
pub(crate) enum Error {
    ResponseExceededBuffer,
    StreamFailed(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseExceededBuffer => write!(
                f,
                "the response overflowed the streaming buffer, this could indicate a malicious server"
            ),
            Self::StreamFailed(e) => write!(f, "the source stream failed: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::StreamFailed(e) => Some(&**e),
            Self::ResponseExceededBuffer => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct EventStreamParser<S> {
    // None once the sentinel is seen, the source ends, or the source fails
    stream: Option<S>,
    buf: Vec<u8>,
    max_size: usize,
    i: usize,
    line: Vec<u8>,
}

impl<S, E> EventStreamParser<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: StdError + Send + Sync + 'static,
{
    pub(crate) fn new(stream: S) -> EventStreamParser<S> {
        Self::with_max_size_and_capacity(
            stream,
            1 << 24, // 16 MiB
            1 << 10, // 1 KiB
        )
    }

    pub(crate) fn with_max_size_and_capacity(
        stream: S,
        max_size: usize,
        init_capacity: usize,
    ) -> EventStreamParser<S> {
        EventStreamParser {
            stream: Some(stream),
            buf: Vec::with_capacity(init_capacity),
            max_size,
            i: 0,
            line: Vec::new(),
        }
    }

    /// True once the parser will not read from the source again.
    pub(crate) fn is_finished(&self) -> bool {
        self.stream.is_none()
    }

    // Drop the source, releasing the underlying connection
    fn finish(&mut self) {
        if !self.buf.is_empty() {
            log::debug!(
                "discarding {} unterminated bytes at the end of the event stream",
                self.buf.len()
            );
        }

        self.stream = None;
        self.buf.clear();
        self.i = 0;
    }

    async fn refill_buffer(&mut self) -> Result<bool, Error> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(false),
        };

        match stream.next().await {
            Some(Ok(b)) => {
                if b.len() + self.buf.len() > self.max_size {
                    return Err(Error::ResponseExceededBuffer);
                }

                self.buf.extend(b);

                Ok(true)
            }
            Some(Err(err)) => Err(Error::StreamFailed(Box::new(err))),
            None => Ok(false),
        }
    }

    // Advance cursor to the next line
    //
    // Returns true when the operation completes successfully
    // and the cursor is positioned on the newline. Otherwise,
    // more data is needed
    fn advance_to_line(&mut self) -> bool {
        let i = &mut self.i;

        // Walk up to \n
        while *i < self.buf.len() && self.buf[*i] != b'\n' {
            *i += 1;
        }

        *i != self.buf.len()
    }

    // Get line without the trailing [\r]\n
    fn striped_line(i: usize, buf: &[u8]) -> &[u8] {
        if i > 0 && buf[i - 1] == b'\r' {
            &buf[..i - 1]
        } else {
            &buf[..i]
        }
    }

    // Moves the next complete line from the input (buf) into the
    // line buffer
    fn extract_line(&mut self) -> bool {
        if !self.advance_to_line() {
            return false;
        }

        let line_content = Self::striped_line(self.i, &self.buf);

        self.line.clear();
        self.line.extend_from_slice(line_content);

        self.buf.remove_first(self.i + 1);
        self.i = 0;

        true
    }

    /// Returns the payload of the next `data: ` line, or `None` once the
    /// sentinel is reached or the source is exhausted.
    pub(crate) async fn next_payload(&mut self) -> Option<Result<&[u8], Error>> {
        loop {
            if self.is_finished() {
                return None;
            }

            while self.extract_line() {
                if !self.line.starts_with(DATA_PREFIX) {
                    continue;
                }

                if &self.line[DATA_PREFIX.len()..] == SENTINEL {
                    self.finish();
                    return None;
                }

                return Some(Ok(&self.line[DATA_PREFIX.len()..]));
            }

            match self.refill_buffer().await {
                Ok(true) => continue,
                Ok(false) => {
                    self.finish();
                    return None;
                }
                Err(err) => {
                    self.finish();
                    return Some(Err(err));
                }
            }
        }
    }

    /// Returns the next payload which deserializes into `T`. Payloads which
    /// fail to deserialize are skipped.
    pub(crate) async fn parse<T: DeserializeOwned>(&mut self) -> Option<Result<T, Error>> {
        loop {
            let parsed = match self.next_payload().await? {
                Ok(payload) => match serde_json::from_slice::<T>(payload) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        log::debug!(
                            "skipping malformed event \"{}\": {}",
                            String::from_utf8_lossy(payload),
                            err
                        );
                        None
                    }
                },
                Err(err) => return Some(Err(err)),
            };

            if let Some(value) = parsed {
                return Some(Ok(value));
            }
        }
    }
}

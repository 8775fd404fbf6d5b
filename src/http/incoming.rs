//! Incremental HTTP/1.1 request head parsing over an async byte stream.
//!
//! [`IncomingParser`] pulls chunks from an [`AsyncRead`] until the blank line
//! ending the head shows up, decomposes the head into an [`IncomingMessage`],
//! and hands the rest of the stream over as a [`Body`]. Bytes read past the
//! delimiter in the same chunk become the first piece of the body; nothing
//! after the delimiter is ever inspected.
//!
//! Both halves are pull-driven: the socket is only read while a caller is
//! awaiting [`IncomingParser::read_head`] or polling the [`Body`], so a slow
//! consumer naturally stops reads from the peer.

use std::cmp;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tracing::{debug, trace};

use super::accumulator::{ByteAccumulator, HEAD_DELIMITER};
use super::{Headers, Method};
use crate::config::ServerConfig;

/// Errors that can occur while reading a request.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection closed with {buffered} bytes of an unterminated request head")]
    IncompleteHead { buffered: usize },

    #[error("request head exceeds maximum allowed size of {max_bytes} bytes")]
    HeadTooLarge { max_bytes: usize },

    #[error("request head has more than {max_headers} header lines")]
    TooManyHeaders { max_headers: usize },

    #[error("malformed request head: {0}")]
    MalformedHead(#[from] httparse::Error),

    #[error("malformed request head: not terminated by an empty line")]
    UnterminatedHead,
}

/// A request head, decomposed best-effort.
///
/// Fields are `None` when the request line has fewer than three
/// space-separated tokens. Header lines without a `": "` separator are kept
/// with a `None` value; callers should treat such a head as malformed, or
/// run [`validate`](Self::validate).
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use h1wire::http::{IncomingMessage, Method};
///
/// let raw = Bytes::from_static(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n");
/// let message = IncomingMessage::from_head(raw);
///
/// assert_eq!(message.method(), Some(&Method::Get));
/// assert_eq!(message.target(), Some("/index.html"));
/// assert_eq!(message.version(), Some("HTTP/1.1"));
/// assert_eq!(message.header("Host"), Some("localhost"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    method: Option<Method>,
    target: Option<String>,
    version: Option<String>,
    headers: Headers<Option<String>>,
    raw_head: Bytes,
}

/// Counts the header lines of a head, request line and blank line excluded.
///
/// Bare `\n` line endings count too, since `httparse` accepts them.
fn header_lines(raw_head: &[u8]) -> usize {
    raw_head
        .iter()
        .filter(|&&byte| byte == b'\n')
        .count()
        .saturating_sub(2)
}

impl IncomingMessage {
    /// Decomposes a raw head, with or without its trailing `\r\n\r\n`.
    ///
    /// The request line is split on single spaces into method, target and
    /// version; extra tokens are ignored. Each following line is split on its
    /// first `": "`. Later duplicates of a header name replace earlier ones.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn from_head(raw_head: Bytes) -> Self {
        let (method, target, version, headers) = {
            let block = raw_head
                .strip_suffix(HEAD_DELIMITER)
                .unwrap_or(&raw_head[..]);
            let text = String::from_utf8_lossy(block);

            let mut lines = text.split("\r\n");
            let mut tokens = lines.next().unwrap_or_default().split(' ');
            let method = tokens.next().map(Method::from);
            let target = tokens.next().map(str::to_owned);
            let version = tokens.next().map(str::to_owned);

            let headers: Headers<Option<String>> = lines
                .map(|line| match line.split_once(": ") {
                    Some((name, value)) => (name, Some(value.to_owned())),
                    None => (line, None),
                })
                .collect();

            (method, target, version, headers)
        };

        Self {
            method,
            target,
            version,
            headers,
            raw_head,
        }
    }

    /// Returns the request method.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Returns the raw request target, e.g. `/search?q=rust`.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns the protocol version token, e.g. `HTTP/1.1`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns every parsed header, including those without a value.
    pub fn headers(&self) -> &Headers<Option<String>> {
        &self.headers
    }

    /// Returns the value of the header named exactly `name`, if it has one.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.as_deref()
    }

    /// Returns the head bytes as received, including the terminating blank line.
    pub fn raw_head(&self) -> &Bytes {
        &self.raw_head
    }

    /// Checks the raw head against `httparse`'s request grammar.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MalformedHead`]: the head violates the HTTP/1.x syntax.
    /// - [`ParseError::UnterminatedHead`]: the head does not end with a blank line.
    pub fn validate(&self) -> Result<(), ParseError> {
        let mut headers = vec![httparse::EMPTY_HEADER; header_lines(&self.raw_head) + 1];
        let mut request = httparse::Request::new(&mut headers);
        match request.parse(&self.raw_head)? {
            httparse::Status::Complete(_) => Ok(()),
            httparse::Status::Partial => Err(ParseError::UnterminatedHead),
        }
    }
}

/// Reads a request head from an async byte stream.
///
/// # Examples
///
/// ```
/// use h1wire::http::IncomingParser;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), h1wire::http::ParseError> {
/// let socket: &[u8] = b"POST /upload HTTP/1.1\r\nContent-Type: text/plain\r\n\r\nhello";
/// let (message, body) = IncomingParser::new(socket).read_head().await?.unwrap();
///
/// assert_eq!(message.target(), Some("/upload"));
/// assert_eq!(&body.collect().await?[..], b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IncomingParser<R> {
    reader: R,
    buf: ByteAccumulator,
    read_buffer_size: usize,
    max_head_size: usize,
    max_headers: usize,
    strict_head: bool,
}

impl<R> IncomingParser<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a parser with the default [`ServerConfig`].
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &ServerConfig::default())
    }

    /// Creates a parser using the limits in `config`.
    pub fn with_config(reader: R, config: &ServerConfig) -> Self {
        Self {
            reader,
            buf: ByteAccumulator::with_capacity(config.read_buffer_size),
            read_buffer_size: config.read_buffer_size,
            max_head_size: config.max_head_size,
            max_headers: config.max_headers,
            strict_head: config.strict_head,
        }
    }

    /// Reads until the head is complete and splits the stream into head and body.
    ///
    /// Returns `Ok(None)` if the stream ends before a single byte arrives.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Io`]: the underlying stream failed.
    /// - [`ParseError::IncompleteHead`]: the stream ended mid-head.
    /// - [`ParseError::HeadTooLarge`]: no delimiter within `max_head_size` bytes.
    /// - [`ParseError::TooManyHeaders`]: more than `max_headers` header lines.
    /// - [`ParseError::MalformedHead`]: only in strict mode, see [`ServerConfig::strict_head`].
    pub async fn read_head(mut self) -> Result<Option<(IncomingMessage, Body<R>)>, ParseError> {
        loop {
            if let Some(pos) = self.buf.find(HEAD_DELIMITER) {
                if pos + HEAD_DELIMITER.len() > self.max_head_size {
                    return Err(ParseError::HeadTooLarge {
                        max_bytes: self.max_head_size,
                    });
                }
                let raw_head = self.buf.split_to(pos + HEAD_DELIMITER.len());
                let header_count = header_lines(&raw_head);
                if header_count > self.max_headers {
                    return Err(ParseError::TooManyHeaders {
                        max_headers: self.max_headers,
                    });
                }
                let leftover = self.buf.into_bytes();
                debug!(
                    head_len = raw_head.len(),
                    headers = header_count,
                    leftover = leftover.len(),
                    "request head complete"
                );

                let message = IncomingMessage::from_head(raw_head);
                if self.strict_head {
                    message.validate()?;
                }
                let body = Body::new(self.reader, leftover, self.read_buffer_size);
                return Ok(Some((message, body)));
            }

            if self.buf.len() > self.max_head_size {
                return Err(ParseError::HeadTooLarge {
                    max_bytes: self.max_head_size,
                });
            }

            self.buf.buffer_mut().reserve(self.read_buffer_size);
            let read = self.reader.read_buf(self.buf.buffer_mut()).await?;
            trace!(bytes = read, buffered = self.buf.len(), "read head chunk");

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(ParseError::IncompleteHead {
                    buffered: self.buf.len(),
                });
            }
        }
    }
}

/// The body of a request: whatever follows the head, relayed verbatim.
///
/// Consume it chunk by chunk with [`chunk`](Self::chunk), all at once with
/// [`collect`](Self::collect), or as an [`AsyncRead`]. Without framing
/// headers support, the body simply runs until the peer closes its side.
#[derive(Debug)]
pub struct Body<R> {
    reader: R,
    leftover: Bytes,
    read_buffer_size: usize,
    finished: bool,
}

impl<R> Body<R>
where
    R: AsyncRead + Unpin,
{
    fn new(reader: R, leftover: Bytes, read_buffer_size: usize) -> Self {
        Self {
            reader,
            leftover,
            read_buffer_size,
            finished: false,
        }
    }

    /// Bytes that arrived together with the head and have not been consumed yet.
    ///
    /// Empty when the delimiter ended the last chunk read.
    pub fn buffered(&self) -> &[u8] {
        &self.leftover
    }

    /// Returns `true` once end of input or a transport error was observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the next piece of the body.
    ///
    /// Yields the bytes buffered with the head first, then one item per
    /// socket read. Returns `None` at end of input. A transport error is
    /// yielded once, after which the body reports `None`.
    pub async fn chunk(&mut self) -> Option<Result<Bytes, ParseError>> {
        if !self.leftover.is_empty() {
            return Some(Ok(std::mem::take(&mut self.leftover)));
        }
        if self.finished {
            return None;
        }

        let mut chunk = BytesMut::with_capacity(self.read_buffer_size);
        match self.reader.read_buf(&mut chunk).await {
            Ok(0) => {
                trace!("request body finished");
                self.finished = true;
                None
            }
            Ok(read) => {
                trace!(bytes = read, "read body chunk");
                Some(Ok(chunk.freeze()))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(ParseError::Io(e)))
            }
        }
    }

    /// Reads the rest of the body into one buffer.
    pub async fn collect(mut self) -> Result<Bytes, ParseError> {
        let mut out = BytesMut::new();
        while let Some(chunk) = self.chunk().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out.freeze())
    }
}

impl<R> AsyncRead for Body<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if !this.leftover.is_empty() {
            let n = cmp::min(this.leftover.len(), buf.remaining());
            buf.put_slice(&this.leftover[..n]);
            this.leftover.advance(n);
            return Poll::Ready(Ok(()));
        }
        if this.finished || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        let before = buf.filled().len();
        let poll = Pin::new(&mut this.reader).poll_read(cx, buf);
        match &poll {
            Poll::Ready(Ok(())) if buf.filled().len() == before => this.finished = true,
            Poll::Ready(Err(_)) => this.finished = true,
            _ => {}
        }
        poll
    }
}

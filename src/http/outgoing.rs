//! HTTP/1.1 response writer.
//!
//! [`OutgoingMessage`] collects a status code and headers, then writes the
//! status line and header block exactly once, right before the first body
//! byte (or on [`end`](OutgoingMessage::end) for an empty body). After that
//! it is a plain pass-through to the underlying stream.

use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::{Headers, StatusCode};

/// Errors produced by [`OutgoingMessage`].
#[derive(Debug, Error)]
pub enum WriteError {
    /// The status line and headers were already written; they can no longer change.
    #[error("headers have already been sent")]
    HeadersSent,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
enum Head {
    Pending {
        status: Option<StatusCode>,
        headers: Headers,
    },
    // Serialized, but the writer has not taken all of it yet.
    Sending {
        status: Option<StatusCode>,
        remaining: Bytes,
    },
    Sent {
        status: Option<StatusCode>,
    },
}

/// The writing half of an exchange.
///
/// # Examples
///
/// ```
/// use h1wire::http::{OutgoingMessage, StatusCode, WriteError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), WriteError> {
/// let mut socket: Vec<u8> = Vec::new();
/// let mut response = OutgoingMessage::new(&mut socket);
/// response.set_status(StatusCode::NOT_FOUND)?;
/// response.write(b"x").await?;
///
/// assert!(matches!(response.set_header("A", "1"), Err(WriteError::HeadersSent)));
/// response.end().await?;
/// assert_eq!(socket, b"HTTP/1.1 404 Not Found\r\n\r\nx");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OutgoingMessage<W> {
    writer: W,
    head: Head,
}

impl<W> OutgoingMessage<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wraps the write half of a connection. No status and no headers are set.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            head: Head::Pending {
                status: None,
                headers: Headers::new(),
            },
        }
    }

    /// Sets the status code, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::HeadersSent`] once the head is on the wire.
    pub fn set_status(&mut self, code: impl Into<StatusCode>) -> Result<(), WriteError> {
        match &mut self.head {
            Head::Pending { status, .. } => {
                *status = Some(code.into());
                Ok(())
            }
            Head::Sending { .. } | Head::Sent { .. } => Err(WriteError::HeadersSent),
        }
    }

    /// Sets a header, replacing the value of an existing header with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::HeadersSent`] once the head is on the wire.
    pub fn set_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), WriteError> {
        match &mut self.head {
            Head::Pending { headers, .. } => {
                headers.set(name, value.into());
                Ok(())
            }
            Head::Sending { .. } | Head::Sent { .. } => Err(WriteError::HeadersSent),
        }
    }

    /// Returns the status code, if one was set.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.head {
            Head::Pending { status, .. }
            | Head::Sending { status, .. }
            | Head::Sent { status } => *status,
        }
    }

    /// Returns the pending headers, or `None` once they have been sent.
    pub fn headers(&self) -> Option<&Headers> {
        match &self.head {
            Head::Pending { headers, .. } => Some(headers),
            Head::Sending { .. } | Head::Sent { .. } => None,
        }
    }

    /// Returns `true` once the status line and headers have been written in full.
    pub fn headers_sent(&self) -> bool {
        matches!(self.head, Head::Sent { .. })
    }

    /// Writes body bytes, sending the head first if it is still pending.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.send_head().await?;
        self.writer.write_all(bytes).await?;
        Ok(())
    }

    /// Sends the head now, without any body bytes, and flushes.
    ///
    /// Does nothing but flush if the head was already sent.
    pub async fn flush_headers(&mut self) -> Result<(), WriteError> {
        self.send_head().await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Copies `reader` to the body until it is exhausted.
    ///
    /// The head is sent before the first copied byte. Returns the number of
    /// body bytes written.
    pub async fn pipe_from<R>(&mut self, reader: &mut R) -> Result<u64, WriteError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.send_head().await?;
        let copied = tokio::io::copy(reader, &mut self.writer).await?;
        Ok(copied)
    }

    /// Finishes the response and closes the write side of the stream.
    ///
    /// A response that never had a body still gets its head.
    pub async fn end(mut self) -> Result<(), WriteError> {
        self.send_head().await?;
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        debug!("response finished");
        Ok(())
    }

    // Cancel safe: a dropped call leaves the unwritten part of the head in
    // `Head::Sending`, and the next call resumes from there.
    async fn send_head(&mut self) -> Result<(), WriteError> {
        if let Head::Pending { status, headers } = &self.head {
            let status = *status;
            let remaining = encode_head(status, headers).freeze();
            self.head = Head::Sending { status, remaining };
        }
        let Head::Sending { status, remaining } = &mut self.head else {
            return Ok(());
        };

        while !remaining.is_empty() {
            let written = self.writer.write(&remaining[..]).await?;
            if written == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            remaining.advance(written);
        }

        let status = *status;
        self.head = Head::Sent { status };
        debug!(status = status.map(StatusCode::as_u16), "response head sent");
        Ok(())
    }
}

/// Serializes a status line and header block, including the blank line.
///
/// A missing status leaves both the code and the reason phrase empty.
///
/// # Examples
///
/// ```
/// use h1wire::http::{Headers, StatusCode, outgoing::encode_head};
///
/// let mut headers = Headers::new();
/// headers.set("Content-Type", "text/html".to_owned());
///
/// let head = encode_head(Some(StatusCode::OK), &headers);
/// assert_eq!(&head[..], b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n");
/// ```
pub fn encode_head(status: Option<StatusCode>, headers: &Headers) -> BytesMut {
    let mut buf = BytesMut::with_capacity(32 + headers.len() * 32);

    match status {
        Some(code) => buf.put(format!("HTTP/1.1 {} {}\r\n", code, code.reason_phrase()).as_bytes()),
        None => buf.put(&b"HTTP/1.1  \r\n"[..]),
    }
    buf.put(headers.to_string().as_bytes());
    buf.put(&b"\r\n"[..]);

    buf
}

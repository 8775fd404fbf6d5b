//! Async TCP server using Tokio.
//!
//! Every accepted connection gets one [`IncomingParser`] bound to its read
//! half and one [`OutgoingMessage`] bound to its write half. Once the request
//! head is parsed, the handler receives the message, its body and the
//! response writer. One request is served per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ServerConfig};
use crate::http::{Body, IncomingMessage, IncomingParser, OutgoingMessage, ParseError, WriteError};

/// Request body type handed to [`Server::run`] handlers.
pub type RequestBody = Body<OwnedReadHalf>;

/// Response writer type handed to [`Server::run`] handlers.
pub type ResponseWriter = OutgoingMessage<OwnedWriteHalf>;

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read request: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to write response: {0}")]
    Write(#[from] WriteError),
}

/// Accepts TCP connections and hands each parsed request to a handler.
///
/// # Examples
///
/// ```rust,no_run
/// use h1wire::http::StatusCode;
/// use h1wire::server::Server;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:3000").await?;
///     server
///         .run(|_request, _body, mut response| async move {
///             response.set_status(StatusCode::OK)?;
///             response.set_header("Content-Type", "text/plain")?;
///             response.write(b"Hello!").await?;
///             response.end().await
///         })
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
}

impl Server {
    /// Binds the server to the given TCP address with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        Self::bind_with_config(addr, ServerConfig::default()).await
    }

    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] for an invalid `config`, otherwise
    /// the same errors as [`bind`](Self::bind).
    pub async fn bind_with_config(
        addr: impl AsRef<str>,
        config: ServerConfig,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            config,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests to `handler`.
    ///
    /// The handler runs once per connection, after the request head has been
    /// parsed. It is shared across all spawned Tokio tasks, so it must be
    /// `Send + Sync + 'static`. An error it returns is logged and the
    /// connection is dropped.
    ///
    /// This method runs until the process is terminated.
    pub async fn run<H, F>(self, handler: H) -> Result<(), ServerError>
    where
        H: Fn(IncomingMessage, RequestBody, ResponseWriter) -> F + Send + Sync + 'static,
        F: Future<Output = Result<(), WriteError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        info!(address = %self.local_addr, "h1wire listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let handler = Arc::clone(&handler);
            let config = self.config.clone();

            tokio::spawn(async move {
                let (reader, writer) = stream.into_split();
                match serve_connection(reader, writer, &config, &*handler).await {
                    Ok(()) => debug!(peer = %peer_addr, "connection closed"),
                    Err(e) => warn!(peer = %peer_addr, error = %e, "connection closed with error"),
                }
            });
        }
    }
}

/// Serves a single request on an already split duplex stream.
///
/// Reads the head from `reader`, then calls `handler` with the parsed
/// message, the remaining body and a writer bound to `writer`. If the peer
/// closes the stream before sending anything, the handler is not called.
///
/// # Errors
///
/// - [`ServerError::Parse`]: the head could not be read.
/// - [`ServerError::Write`]: the handler failed.
pub async fn serve_connection<R, W, H, F>(
    reader: R,
    writer: W,
    config: &ServerConfig,
    handler: &H,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    H: Fn(IncomingMessage, Body<R>, OutgoingMessage<W>) -> F + ?Sized,
    F: Future<Output = Result<(), WriteError>>,
{
    let parser = IncomingParser::with_config(reader, config);
    let Some((message, body)) = parser.read_head().await? else {
        debug!("connection closed before a request arrived");
        return Ok(());
    };

    debug!(
        method = message.method().map(|m| m.as_str()).unwrap_or_default(),
        target = message.target().unwrap_or_default(),
        "dispatching request"
    );
    handler(message, body, OutgoingMessage::new(writer)).await?;
    Ok(())
}

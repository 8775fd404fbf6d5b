//! # h1wire
//!
//! Minimal HTTP/1.1 message framing on top of any async duplex byte stream.
//!
//! The read side finds the end of the request head in a chunked stream
//! without consuming body bytes, and the write side emits the status line and
//! headers exactly once before the response body.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use h1wire::server::Server;
//! use h1wire::http::StatusCode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:3000").await?;
//!     println!("Listening on http://{}", server.local_addr());
//!     server
//!         .run(|request, _body, mut response| async move {
//!             response.set_status(StatusCode::OK)?;
//!             response.set_header("Content-Type", "text/plain")?;
//!             let target = request.target().unwrap_or("/").to_owned();
//!             response.write(target.as_bytes()).await?;
//!             response.end().await
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod http;
pub mod server;

pub use config::ServerConfig;
pub use http::{
    Body, Headers, IncomingMessage, IncomingParser, Method, OutgoingMessage, ParseError,
    StatusCode, WriteError,
};
pub use server::{Server, ServerError};

//! HTTP/1.1 message framing.
//!
//! This module provides the framing primitives:
//! [`IncomingParser`] and [`Body`] on the read side, [`OutgoingMessage`] on
//! the write side, plus [`Method`], [`StatusCode`] and [`Headers`].

use std::fmt;

pub mod accumulator;
pub mod headers;
pub mod incoming;
pub mod outgoing;

pub use accumulator::ByteAccumulator;
pub use headers::Headers;
pub use incoming::{Body, IncomingMessage, IncomingParser, ParseError};
pub use outgoing::{OutgoingMessage, WriteError};

/// An HTTP response status code.
///
/// Any `u16` is accepted. Only a handful of common codes carry a reason
/// phrase; every other code serialises with an empty one.
///
/// # Examples
///
/// ```
/// use h1wire::http::StatusCode;
///
/// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
/// assert_eq!(StatusCode::NOT_FOUND.reason_phrase(), "Not Found");
/// assert_eq!(StatusCode::new(201).reason_phrase(), "");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Wraps any numeric code.
    pub const fn new(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the reason phrase written after the code in the status line.
    ///
    /// Codes outside the table yield `""`.
    pub fn reason_phrase(self) -> &'static str {
        match self.0 {
            200 => "OK",
            403 => "Forbidden",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

/// The method token of a request line.
///
/// Standard methods are unit variants. Any other token, including an empty
/// one produced by a malformed request line, is kept verbatim in `Custom`.
///
/// # Examples
///
/// ```
/// use h1wire::http::Method;
///
/// let method: Method = "GET".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
///
/// let custom: Method = "PURGE".parse().unwrap();
/// assert_eq!(custom, Method::Custom("PURGE".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Connect,
    Trace,
    /// Any other token, stored as received.
    Custom(String),
}

impl Method {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_table() {
        assert_eq!(StatusCode::OK.reason_phrase(), "OK");
        assert_eq!(StatusCode::FORBIDDEN.reason_phrase(), "Forbidden");
        assert_eq!(StatusCode::new(500).reason_phrase(), "Internal Server Error");
        assert_eq!(StatusCode::new(418).reason_phrase(), "");
        assert_eq!(StatusCode::new(302).to_string(), "302");
    }

    #[test]
    fn method_round_trips_custom_tokens() {
        assert_eq!(Method::from("DELETE"), Method::Delete);
        assert_eq!(Method::from("get"), Method::Custom("get".to_owned()));
        assert_eq!(Method::from("").as_str(), "");
    }
}

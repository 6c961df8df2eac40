//! maker_stream - incremental HTTP/1.x request parsing and exact-match routing
//!
//! The core of a small HTTP server without the server: bytes go in through
//! [`Parser::feed`] in whatever chunks the transport delivers, a structured
//! [`Request`] comes out, and a [`Router`] turns it into a response string.
//! Sockets, response formatting and connection management stay with the
//! caller.
//!
//! # Parsing
//!
//! - **Chunk-independent** - the same message fed in one call or byte by byte
//!   yields the same [`Request`]
//! - **Progressive** - method, URL and each header are available through
//!   [`Parser::request`] as soon as they are complete
//! - **Bounded** - every buffered part has a [limit](limits::ReqLimits)
//! - **Tolerant where it is safe** - unknown methods and versions, malformed
//!   percent-escapes and empty header values are represented, not rejected
//!
//! Bodies are framed by `Content-Length` only; chunked transfer coding is
//! refused with [`Error::UnsupportedTransferEncoding`].
//!
//! # Examples
//!
//! Feeding a request in pieces:
//! ```
//! use maker_stream::{Method, Parser};
//!
//! let mut parser = Parser::new();
//!
//! let chunks: [&[u8]; 3] = [b"GET /search?q=hello%20wor", b"ld&sort=asc HTTP/1.1\r\nHo", b"st: x\r\n\r\n"];
//! for chunk in chunks {
//!     parser.feed(chunk).unwrap();
//! }
//!
//! let req = parser.take_request().unwrap();
//! assert_eq!(req.method(), Method::Get);
//! assert_eq!(req.path(), "/search");
//! assert_eq!(req.query_param("q"), Some("hello world"));
//! assert_eq!(req.header("Host"), Some("x"));
//! ```
//! Routing it:
//! ```
//! use maker_stream::{router::NOT_FOUND, Method, Request, Router};
//!
//! let mut router = Router::new();
//! router.add_route(Method::Get, "/search", |req: &Request| {
//!     format!("results for {}", req.query_param("q").unwrap_or_default())
//! });
//!
//! let req = Request::parse(b"GET /search?q=rust HTTP/1.1\r\n\r\n").unwrap();
//! assert_eq!(router.route_request(&req), "results for rust");
//!
//! let req = Request::parse(b"HEAD /search HTTP/1.1\r\n\r\n").unwrap();
//! assert_eq!(router.route_request(&req), NOT_FOUND);
//! ```
//!
//! # Logging
//!
//! Events are emitted through [`tracing`](https://docs.rs/tracing) at
//! `trace` and `debug` level. No subscriber is installed by this crate.

pub(crate) mod http {
    pub mod query;
    pub(crate) mod engine;
    pub(crate) mod headers;
    pub(crate) mod parser;
    pub(crate) mod request;
    pub(crate) mod types;
}
pub(crate) mod routing {
    pub mod router;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::Error,
    http::{
        headers::{normalize_header_field, trim, Headers},
        parser::{Parser, State},
        query::{self, parse_query_string, url_decode, QueryParams},
        request::Request,
        types::{Method, Version},
    },
    routing::router::{self, Handler, RouteKey, Router},
};

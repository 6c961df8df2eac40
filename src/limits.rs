//! Request parsing limits
//!
//! # Security-First Defaults
//!
//! The parser buffers the URL, every header and the body in memory, so each
//! of them has an upper bound. Defaults are generous enough for ordinary API
//! traffic while still preventing:
//! - Memory exhaustion through oversized bodies
//! - Header flooding
//! - Unbounded request lines
//!
//! Exceeding a limit fails the parse with a dedicated [`Error`](crate::Error)
//! variant (see [`Error::is_limit`](crate::Error::is_limit)).
//!
//! # Examples
//!
//! ```
//! use maker_stream::{limits::ReqLimits, Parser};
//!
//! let mut parser = Parser::with_limits(ReqLimits {
//!     header_count: 16,      // Fewer headers for an internal service
//!     body_size: 16 * 1024,  // 16KB bodies
//!     ..ReqLimits::default()
//! });
//!
//! parser.feed(b"GET / HTTP/1.1\r\n\r\n").unwrap();
//! assert!(parser.is_complete());
//! ```

/// Per-request size limits applied while parsing.
///
/// All sizes are in bytes unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReqLimits {
    /// Maximum length of the method token (default: `16`)
    ///
    /// Unknown methods are accepted as [`Method::Unknown`](crate::Method::Unknown),
    /// this only bounds how many bytes the parser keeps for the token.
    pub method_size: usize,

    /// Maximum length of the request target, path and query included
    /// (default: `8192`).
    pub url_size: usize,

    /// Maximum number of query parameters (default: `64`)
    ///
    /// Counted before duplicates are merged, so `?a=1&a=2` uses two.
    pub url_query_parts: usize,

    /// Maximum length of a header name (default: `256`)
    pub header_name_size: usize,

    /// Maximum length of a header value, folded lines included (default: `8192`)
    pub header_value_size: usize,

    /// Maximum number of header lines (default: `64`)
    ///
    /// Duplicate names count once per line even though only the last
    /// value is kept.
    pub header_count: usize,

    /// Maximum declared `Content-Length` (default: `1MB`)
    pub body_size: usize,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            method_size: 16,
            url_size: 8 * 1024,
            url_query_parts: 64,
            header_name_size: 256,
            header_value_size: 8 * 1024,
            header_count: 64,
            body_size: 1024 * 1024,

            _priv: (),
        }
    }
}

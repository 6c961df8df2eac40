use crate::{
    http::{
        headers::{self, Headers},
        query::QueryParams,
    },
    limits::ReqLimits,
    Error, Method, Parser, Version,
};
use std::{net::SocketAddr, str::FromStr};

/// A parsed HTTP/1.x request.
///
/// Produced incrementally by a [`Parser`]; every accessor reflects what has
/// been parsed so far, so a request taken from a completed parser is final.
///
/// # Input format
///
/// - `SP`: ASCII space (0x20)
/// - `CRLF`: Carriage return + line feed (`"\r\n"`), **exactly this sequence required**
///
/// ## First line
/// ```text
/// [METHOD] SP [TARGET] SP "HTTP/" DIGIT "." DIGIT CRLF
/// ```
/// Empty lines before the first line are skipped.
///
/// - `[METHOD]`: any token; unknown tokens become [`Method::Unknown`]
/// - `[TARGET]`: visible characters up to the next space. Everything before
///   the first `?` is the [path](Request::path), everything after it the
///   [query](Request::query_string)
///
/// ## Header
/// ```text
/// [NAME] ":" OWS [VALUE] OWS CRLF
/// ```
/// Names are stored lower-case and values trimmed, so lookups through
/// [`Request::header`] are case-insensitive. A line starting with a space
/// or tab continues the previous value (obsolete line folding); the fold
/// is replaced by a single space. Bytes that are not valid UTF-8 (such as
/// Latin-1 `obs-text`) are kept as `U+FFFD`, in values and in the target.
///
/// Examples:
/// ```text
/// Content-Type: text/plain\r\n     // ("content-type", "text/plain")
/// X-Empty:\r\n                     // ("x-empty", "")
/// Name:   padded value  \r\n       // ("name", "padded value")
/// ```
///
/// ## Body
///
/// The body length is taken from `Content-Length`; without it the body is
/// empty. A `Transfer-Encoding` that lists `chunked` is refused, chunked
/// bodies are **not supported**. Other codings are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) version: Version,

    pub(crate) raw_url: String,
    pub(crate) path_end: usize,
    pub(crate) query_params: QueryParams,

    pub(crate) headers: Headers,
    pub(crate) content_length: Option<usize>,

    pub(crate) body: Vec<u8>,

    pub(crate) remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Parses a complete request held in a single buffer.
    ///
    /// Fails with [`Error::Incomplete`] if the buffer ends before the
    /// message does, and with [`Error::UnexpectedData`] if it holds more.
    ///
    /// ```
    /// use maker_stream::{Method, Request};
    ///
    /// let req = Request::parse(b"DELETE /users/7?hard=true HTTP/1.1\r\nHost: api\r\n\r\n").unwrap();
    ///
    /// assert_eq!(req.method(), Method::Delete);
    /// assert_eq!(req.path(), "/users/7");
    /// assert_eq!(req.query_param_as::<bool>("hard"), Some(true));
    /// ```
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::parse_with_limits(data, ReqLimits::default())
    }

    /// Same as [`Request::parse`] with custom limits.
    pub fn parse_with_limits(data: &[u8], limits: ReqLimits) -> Result<Self, Error> {
        let mut parser = Parser::with_limits(limits);
        parser.feed(data)?;

        parser.take_request().ok_or(Error::Incomplete)
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline(always)]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// The request target exactly as received, query string included.
    #[inline(always)]
    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    /// The request target up to (not including) the first `?`.
    ///
    /// Not decoded or normalized.
    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.raw_url[..self.path_end]
    }

    /// The raw query string after the first `?`.
    ///
    /// `None` when the target has no `?`, `Some("")` when it ends with one,
    /// so that `path + "?" + query` always rebuilds [`Request::raw_url`].
    #[inline]
    pub fn query_string(&self) -> Option<&str> {
        self.raw_url.get(self.path_end + 1..)
    }

    /// All decoded query parameters.
    ///
    /// Escapes that decode to invalid UTF-8 (`%FF`) are stored as `U+FFFD`;
    /// use [`url_decode_bytes`](crate::query::url_decode_bytes) on
    /// [`Request::query_string`] for the exact bytes.
    #[inline(always)]
    pub const fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// Returns the decoded value of a query parameter.
    ///
    /// Keys are matched after decoding and case-sensitively. Decoding is
    /// lossy, see [`Request::query_params`].
    #[inline]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    /// Returns a query parameter converted with [`FromStr`].
    ///
    /// `None` if the parameter is missing or does not parse.
    ///
    /// ```
    /// use maker_stream::Request;
    ///
    /// let req = Request::parse(b"GET /items?limit=25&page=x HTTP/1.1\r\n\r\n").unwrap();
    ///
    /// assert_eq!(req.query_param_as::<u32>("limit"), Some(25));
    /// assert_eq!(req.query_param_as::<u32>("page"), None);
    /// assert_eq!(req.query_param_as::<u32>("sort"), None);
    /// ```
    #[inline]
    pub fn query_param_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.query_param(key)?.parse().ok()
    }

    /// Like [`Request::query_param_as`], falling back to `default`.
    ///
    /// ```
    /// use maker_stream::Request;
    ///
    /// let req = Request::parse(b"GET /items?page=3 HTTP/1.1\r\n\r\n").unwrap();
    ///
    /// assert_eq!(req.query_param_or("page", 1u32), 3);
    /// assert_eq!(req.query_param_or("limit", 20u32), 20);
    /// ```
    #[inline]
    pub fn query_param_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.query_param_as(key).unwrap_or(default)
    }

    /// All headers, keyed by lower-case name.
    #[inline(always)]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns a header value with case-insensitive name matching
    /// (per [RFC 9110](https://datatracker.ietf.org/doc/html/rfc9110#section-5.1)).
    ///
    /// ```
    /// use maker_stream::Request;
    ///
    /// let req = Request::parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
    ///
    /// assert_eq!(req.header("host"), Some("example.com"));
    /// assert_eq!(req.header("HOST"), Some("example.com"));
    /// assert_eq!(req.header("Host"), Some("example.com"));
    /// assert_eq!(req.header("Accept"), None);
    /// ```
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.headers.get(name) {
            Some(value) => Some(value.as_str()),
            None => self
                .headers
                .get(&headers::normalize_header_field(name))
                .map(String::as_str),
        }
    }

    /// Returns the value of the `Content-Length` header if present.
    #[inline(always)]
    pub const fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Returns the body bytes received so far.
    #[inline(always)]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as text if it is valid UTF-8.
    #[inline]
    pub fn body_str(&self) -> Option<&str> {
        simdutf8::basic::from_utf8(&self.body).ok()
    }

    /// Peer address, if the transport recorded one.
    #[inline(always)]
    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Records the peer address. The parser never sets it.
    #[inline(always)]
    pub fn set_remote_addr(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }
}

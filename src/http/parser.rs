use crate::{
    errors::Error,
    http::{
        engine::{Engine, Events},
        headers::{normalize_header_field, trim},
        query::Query,
        request::Request,
        types::{self, Method, Version},
    },
    limits::ReqLimits,
};
use memchr::memchr;
use std::mem;
use tracing::{debug, trace};

/// Coarse position of a [`Parser`] within the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing but optional empty lines seen yet.
    Start,
    /// Inside the method, target or version.
    RequestLine,
    /// At the start of a header line or inside a header name.
    HeaderField,
    /// Inside a header value or its line ending.
    HeaderValue,
    /// The header block ended and the declared body has not started yet.
    HeadersComplete,
    /// Part of the declared body has been received.
    Body,
    /// The whole message has been received.
    MessageComplete,
    /// A previous `feed` failed; [`Parser::reset`] is required.
    Failed,
}

/// Incremental HTTP/1.x request parser.
///
/// Bytes can be fed in chunks of any size, split at any position. The
/// resulting [`Request`] does not depend on how the message was split.
///
/// One parser handles one message at a time. After completion or failure
/// it must be [reset](Parser::reset) (or drained with
/// [`take_request`](Parser::take_request)) before the next one.
///
/// # Examples
/// ```
/// use maker_stream::{Method, Parser, State};
///
/// let mut parser = Parser::new();
///
/// parser.feed(b"POST /echo HTTP/1.1\r\nContent-Le").unwrap();
/// assert_eq!(parser.state(), State::HeaderField);
///
/// parser.feed(b"ngth: 3\r\n\r\nab").unwrap();
/// assert!(!parser.is_complete());
///
/// parser.feed(b"c").unwrap();
/// assert!(parser.is_complete());
///
/// let req = parser.take_request().unwrap();
/// assert_eq!(req.method(), Method::Post);
/// assert_eq!(req.body(), b"abc");
/// assert_eq!(parser.state(), State::Start);
/// ```
#[derive(Debug)]
pub struct Parser {
    engine: Engine,
    builder: Builder,
    limits: ReqLimits,
}

impl Parser {
    /// Creates a parser with the default [`ReqLimits`].
    #[inline]
    pub fn new() -> Self {
        Self::with_limits(ReqLimits::default())
    }

    /// Creates a parser with custom limits.
    pub fn with_limits(limits: ReqLimits) -> Self {
        Self {
            engine: Engine::new(&limits),
            builder: Builder::new(&limits),
            limits,
        }
    }

    #[inline(always)]
    pub const fn limits(&self) -> &ReqLimits {
        &self.limits
    }

    /// Returns the parser to [`State::Start`] and discards the current request.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.builder.reset();
    }

    /// Feeds the next chunk of the message.
    ///
    /// An empty chunk is always accepted unless the parser has failed.
    /// Completion is reported by [`Parser::is_complete`], not by the return
    /// value.
    ///
    /// # Errors
    /// - grammar and limit violations, see [`Error`]
    /// - [`Error::UnexpectedData`] for bytes after a complete message
    /// - [`Error::NeedsReset`] if an earlier call failed
    pub fn feed(&mut self, data: &[u8]) -> Result<(), Error> {
        let was_complete = self.builder.complete;
        let state = self.engine.state();
        trace!(len = data.len(), ?state, "feed");

        if let Err(err) = self.engine.execute(data, &self.limits, &mut self.builder) {
            debug!(error = %err, ?state, "request parse failed");
            return Err(err);
        }

        if self.builder.complete && !was_complete {
            let req = &self.builder.request;
            debug!(
                method = %req.method(),
                path = req.path(),
                body = req.body().len(),
                "request complete"
            );
        }

        Ok(())
    }

    /// `true` once the full message (headers and declared body) was received.
    #[inline(always)]
    pub const fn is_complete(&self) -> bool {
        self.builder.complete
    }

    #[inline]
    pub fn state(&self) -> State {
        self.engine.state()
    }

    /// The request as parsed so far.
    ///
    /// Fields are filled in as soon as they are known: the URL after the
    /// request target, each header once the next line starts, the body as it
    /// arrives.
    #[inline(always)]
    pub const fn request(&self) -> &Request {
        &self.builder.request
    }

    /// Moves the finished request out and resets the parser.
    ///
    /// Returns `None`, leaving everything untouched, while the message is
    /// incomplete.
    pub fn take_request(&mut self) -> Option<Request> {
        if !self.builder.complete {
            return None;
        }

        let req = mem::take(&mut self.builder.request);
        self.reset();
        Some(req)
    }
}

impl Default for Parser {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles a [`Request`] from engine events.
#[derive(Debug)]
struct Builder {
    request: Request,

    url: Vec<u8>,
    field: Vec<u8>,
    value: Vec<u8>,
    // A value span was seen for the pending field
    in_value: bool,

    complete: bool,
    query_limit: usize,
}

impl Builder {
    fn new(limits: &ReqLimits) -> Self {
        Self {
            request: Request::default(),

            url: Vec::with_capacity(limits.url_size.min(1024)),
            field: Vec::with_capacity(64),
            value: Vec::with_capacity(256),
            in_value: false,

            complete: false,
            query_limit: limits.url_query_parts,
        }
    }

    fn reset(&mut self) {
        self.request = Request::default();

        self.url.clear();
        self.field.clear();
        self.value.clear();
        self.in_value = false;

        self.complete = false;
    }

    fn commit_header(&mut self) {
        let name = normalize_header_field(&types::to_text(&self.field));
        let value = trim(&types::to_text(&self.value)).to_owned();

        if let Some(previous) = self.request.headers.insert(name, value) {
            trace!(previous = %previous, "duplicate header replaced");
        }

        self.field.clear();
        self.value.clear();
        self.in_value = false;
    }
}

impl Events for Builder {
    #[inline]
    fn on_method(&mut self, token: &[u8]) {
        self.request.method = Method::from_bytes(token);
    }

    #[inline]
    fn on_url(&mut self, fragment: &[u8]) {
        self.url.extend_from_slice(fragment);
    }

    fn on_url_complete(&mut self) -> Result<(), Error> {
        let url = types::to_text(&self.url).into_owned();
        let path_end = memchr(b'?', url.as_bytes()).unwrap_or(url.len());

        if let Some(query) = url.get(path_end + 1..) {
            Query::parse_into(&mut self.request.query_params, query, self.query_limit)?;
        }

        self.request.raw_url = url;
        self.request.path_end = path_end;
        Ok(())
    }

    #[inline]
    fn on_header_field(&mut self, fragment: &[u8]) {
        if self.in_value {
            self.commit_header();
        }

        self.field.extend_from_slice(fragment);
    }

    #[inline]
    fn on_header_value(&mut self, fragment: &[u8]) {
        self.in_value = true;
        self.value.extend_from_slice(fragment);
    }

    fn on_headers_complete(&mut self, major: u8, minor: u8, content_length: Option<usize>) {
        if self.in_value {
            self.commit_header();
        }

        self.request.version = Version::from_numbers(major, minor);
        self.request.content_length = content_length;
        if let Some(len) = content_length {
            self.request.body.reserve_exact(len);
        }
    }

    #[inline]
    fn on_body(&mut self, chunk: &[u8]) {
        self.request.body.extend_from_slice(chunk);
    }

    #[inline]
    fn on_message_complete(&mut self) {
        self.complete = true;
    }
}

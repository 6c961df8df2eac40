use crate::query;
use std::{error, fmt};

/// Reasons a request could not be parsed.
///
/// Only structural problems end up here. Degenerate but well-formed input
/// (an unknown method or version, malformed percent-escapes, odd headers)
/// is represented in the [`Request`](crate::Request) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The method token is empty, too long or contains a non-token byte.
    InvalidMethod,

    /// The request target is empty or contains a control byte.
    InvalidUrl,
    /// The request target exceeds [`ReqLimits::url_size`](crate::limits::ReqLimits::url_size).
    UriTooLong,
    /// The query string has more parameters than allowed.
    Query(query::Error),

    /// The version is not `HTTP/<digit>.<digit>` followed by CRLF.
    InvalidVersion,

    /// A header line breaks the `name ":" value CRLF` grammar.
    InvalidHeader,
    /// A header name or value exceeds its configured size.
    HeaderTooLarge,
    /// More header lines than [`ReqLimits::header_count`](crate::limits::ReqLimits::header_count).
    TooManyHeaders,
    /// `Content-Length` is not a decimal number, or repeated with another value.
    InvalidContentLength,
    /// `Transfer-Encoding` lists `chunked`; only `Content-Length` framing is supported.
    UnsupportedTransferEncoding,
    /// The declared body exceeds [`ReqLimits::body_size`](crate::limits::ReqLimits::body_size).
    BodyTooLarge,

    /// Bytes arrived after the message was complete.
    ///
    /// # Fields
    /// - `0`: number of unexpected bytes in the rejected call
    UnexpectedData(usize),
    /// The input ended before the message was complete.
    Incomplete,
    /// The parser failed earlier and has not been reset.
    NeedsReset,
}

impl Error {
    /// Returns `true` if the failure comes from a configured
    /// [limit](crate::limits::ReqLimits) rather than from the grammar.
    ///
    /// ```
    /// use maker_stream::Error;
    ///
    /// assert!(Error::BodyTooLarge.is_limit());
    /// assert!(!Error::InvalidHeader.is_limit());
    /// ```
    #[inline]
    pub const fn is_limit(&self) -> bool {
        matches!(
            self,
            Error::UriTooLong
                | Error::Query(query::Error::OverLimit(_))
                | Error::HeaderTooLarge
                | Error::TooManyHeaders
                | Error::BodyTooLarge
        )
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Query(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidMethod => f.write_str("Invalid HTTP method"),
            Error::InvalidUrl => f.write_str("Invalid URL format"),
            Error::UriTooLong => f.write_str("Request target too long"),
            Error::Query(err) => write!(f, "Invalid query string: {}", err),
            Error::InvalidVersion => f.write_str("Invalid HTTP version"),
            Error::InvalidHeader => f.write_str("Invalid header format"),
            Error::HeaderTooLarge => f.write_str("Header name or value too large"),
            Error::TooManyHeaders => f.write_str("Too many headers"),
            Error::InvalidContentLength => f.write_str("Invalid Content-Length"),
            Error::UnsupportedTransferEncoding => f.write_str("Chunked transfer coding is not supported"),
            Error::BodyTooLarge => f.write_str("Request body too large"),
            Error::UnexpectedData(len) => {
                write!(f, "Unexpected data after complete message: {} bytes", len)
            }
            Error::Incomplete => f.write_str("Incomplete request"),
            Error::NeedsReset => f.write_str("Parser must be reset after a failure"),
        }
    }
}

impl From<query::Error> for Error {
    fn from(err: query::Error) -> Self {
        Error::Query(err)
    }
}

#![allow(rustdoc::bare_urls)]

//! Core HTTP protocol types and utilities

use std::{borrow::Cow, convert::Infallible, fmt, str::FromStr};

// TO LOWER CASE

#[rustfmt::skip]
const ASCII_TABLE: [u8; 256] = [
    //   x0    x1    x2    x3    x4    x5    x6    x7    x8    x9    xA    xB    xC    xD    xE    xF
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // 0x
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, // 1x
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F, // 2x
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, // 3x
    0x40, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 4x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x5B, 0x5C, 0x5D, 0x5E, 0x5F, // 5x
    0x60, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 6x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x7B, 0x7C, 0x7D, 0x7E, 0x7F, // 7x
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F, // 8x
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0x9B, 0x9C, 0x9D, 0x9E, 0x9F, // 9x
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, // Ax
    0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF, // Bx
    0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD, 0xCE, 0xCF, // Cx
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF, // Dx
    0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xED, 0xEE, 0xEF, // Ex
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF, // Fx
];

#[inline(always)]
pub(crate) fn to_lower_case(src: &mut [u8]) {
    for byte in src.iter_mut() {
        *byte = ASCII_TABLE[*byte as usize];
    }
}

#[inline(always)]
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: usize = 0;

    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

// Invalid sequences become U+FFFD; obs-text must not fail the request
#[inline]
pub(crate) fn to_text(bytes: &[u8]) -> Cow<'_, str> {
    match simdutf8::basic::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => String::from_utf8_lossy(bytes),
    }
}

// RFC 9110 `tchar`
#[inline(always)]
pub(crate) const fn is_token(byte: u8) -> bool {
    matches!(
        byte,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z'
    )
}

// METHOD

/// HTTP request methods
///
/// Every method token maps to a variant: tokens outside the known set
/// become [`Method::Unknown`] instead of failing the parse. Matching is
/// exact and case-sensitive, so `get` is `Unknown`.
///
/// # References
///
/// - [RFC 9110, Section 9](https://datatracker.ietf.org/doc/html/rfc9110#section-9)
/// - [RFC 5789](https://datatracker.ietf.org/doc/html/rfc5789) (PATCH method)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// GET method - transfer a current representation of the target resource
    /// [[RFC9110, Section 9.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.1)]
    Get,
    /// POST method - perform resource-specific processing on the request payload
    /// [[RFC9110, Section 9.3.3](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.3)]
    Post,
    /// PUT method - replace all current representations of the target resource with the request payload
    /// [[RFC9110, Section 9.3.4](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.4)]
    Put,
    /// DELETE method - remove all current representations of the target resource
    /// [[RFC9110, Section 9.3.5](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.5)]
    Delete,
    /// PATCH method - apply partial modifications to a resource
    /// [[RFC5789, Section 2](https://datatracker.ietf.org/doc/html/rfc5789#section-2)]
    Patch,
    /// HEAD method - same as GET but without response body
    /// [[RFC9110, Section 9.3.2](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.2)]
    Head,
    /// OPTIONS method - describe the communication options for the target resource
    /// [[RFC9110, Section 9.3.7](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.7)]
    Options,
    /// TRACE method - perform a message loop-back test along the path to the target resource
    /// [[RFC9110, Section 9.3.8](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.8)]
    Trace,
    /// CONNECT method - establish a tunnel to the server identified by the target resource
    /// [[RFC9110, Section 9.3.6](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.6)]
    Connect,
    /// Any token not listed above
    #[default]
    Unknown,
}

impl Method {
    /// Maps a request-line method token to a [`Method`].
    ///
    /// ```
    /// use maker_stream::Method;
    ///
    /// assert_eq!(Method::from_bytes(b"PATCH"), Method::Patch);
    /// assert_eq!(Method::from_bytes(b"BREW"), Method::Unknown);
    /// ```
    #[inline]
    pub const fn from_bytes(src: &[u8]) -> Self {
        match src {
            b"GET" => Method::Get,
            b"POST" => Method::Post,
            b"PUT" => Method::Put,
            b"DELETE" => Method::Delete,
            b"PATCH" => Method::Patch,
            b"HEAD" => Method::Head,
            b"OPTIONS" => Method::Options,
            b"TRACE" => Method::Trace,
            b"CONNECT" => Method::Connect,
            _ => Method::Unknown,
        }
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
            Method::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Method::from_bytes(s.as_bytes()))
    }
}

// VERSION

/// HTTP protocol version declared on the request line
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// HTTP/1.0 - Added headers and status codes (1996)
    ///
    /// [RFC 1945](https://tools.ietf.org/html/rfc1945)
    Http10,

    /// HTTP/1.1 - Current text protocol with keep-alive (1999)
    ///
    /// [RFC 9112](https://datatracker.ietf.org/doc/html/rfc9112)
    Http11,

    /// HTTP/2.0 as written on a text request line.
    ///
    /// Only the label is recognised, HTTP/2 framing is not.
    Http20,

    /// Any other `major.minor` pair
    #[default]
    Unknown,
}

impl Version {
    /// Derives the version from the request line's `major.minor` digits.
    ///
    /// `1.1` and `1.0` are exact, any `2.x` is [`Version::Http20`],
    /// everything else (including `1.2`) is [`Version::Unknown`].
    ///
    /// ```
    /// use maker_stream::Version;
    ///
    /// assert_eq!(Version::from_numbers(1, 1), Version::Http11);
    /// assert_eq!(Version::from_numbers(2, 0), Version::Http20);
    /// assert_eq!(Version::from_numbers(3, 0), Version::Unknown);
    /// ```
    #[inline]
    pub const fn from_numbers(major: u8, minor: u8) -> Self {
        match (major, minor) {
            (1, 1) => Version::Http11,
            (1, 0) => Version::Http10,
            (2, _) => Version::Http20,
            _ => Version::Unknown,
        }
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Http20 => "HTTP/2.0",
            Version::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_case() {
        let mut value = *b"Content-TYPE_09~\xC3\x9C";
        to_lower_case(&mut value);
        assert_eq!(&value, b"content-type_09~\xC3\x9C");
    }

    #[test]
    fn parse_usize() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<usize>); 7] = [
            (b"0",      Some(0)),
            (b"42",     Some(42)),
            (b"007",    Some(7)),
            (b"",       None),
            (b"12a",    None),
            (b"-1",     None),
            (b"999999999999999999999", None),
        ];

        for (value, expected) in cases {
            assert_eq!(slice_to_usize(value), expected);
        }
    }

    #[test]
    fn method() {
        #[rustfmt::skip]
        let cases: [(&[u8], Method); 13] = [
            (b"GET",     Method::Get),
            (b"POST",    Method::Post),
            (b"PUT",     Method::Put),
            (b"DELETE",  Method::Delete),
            (b"PATCH",   Method::Patch),
            (b"HEAD",    Method::Head),
            (b"OPTIONS", Method::Options),
            (b"TRACE",   Method::Trace),
            (b"CONNECT", Method::Connect),

            (b"get",     Method::Unknown),
            (b"GETS",    Method::Unknown),
            (b"PROPFIND", Method::Unknown),
            (b"",        Method::Unknown),
        ];

        for (token, expected) in cases {
            assert_eq!(Method::from_bytes(token), expected);
        }

        assert_eq!("DELETE".parse::<Method>(), Ok(Method::Delete));
        assert_eq!(Method::Options.to_string(), "OPTIONS");
        assert_eq!(Method::default(), Method::Unknown);
    }

    #[test]
    fn version() {
        #[rustfmt::skip]
        let cases = [
            ((1, 1), Version::Http11),
            ((1, 0), Version::Http10),
            ((2, 0), Version::Http20),
            ((2, 1), Version::Http20),
            ((1, 2), Version::Unknown),
            ((0, 9), Version::Unknown),
            ((3, 0), Version::Unknown),
        ];

        for ((major, minor), expected) in cases {
            assert_eq!(Version::from_numbers(major, minor), expected);
        }

        assert_eq!(Version::Http11.to_string(), "HTTP/1.1");
        assert_eq!(Version::Unknown.as_str(), "UNKNOWN");
    }

    #[test]
    fn text() {
        #[rustfmt::skip]
        let cases: [(&[u8], &str); 5] = [
            (b"plain",          "plain"),
            (b"caf\xC3\xA9",     "café"),
            (b"caf\xE9",        "caf\u{FFFD}"),
            (b"\xFF\xFEx",      "\u{FFFD}\u{FFFD}x"),
            (b"",               ""),
        ];

        for (bytes, expected) in cases {
            assert_eq!(to_text(bytes), expected);
        }
        assert!(matches!(to_text(b"ok"), Cow::Borrowed(_)));
    }

    #[test]
    fn token() {
        assert!(b"X-Request-ID".iter().all(|&b| is_token(b)));
        assert!(!is_token(b' '));
        assert!(!is_token(b':'));
        assert!(!is_token(b'\r'));
        assert!(!is_token(0x80));
    }
}

//! URL percent-decoding and query string parsing.

use memchr::{memchr, memchr2};
use std::{borrow::Cow, collections::HashMap, error, fmt};

/// Decoded query parameters, last occurrence of a key wins.
pub type QueryParams = HashMap<String, String>;

/// Decodes a URL component: `+` becomes a space and `%XX` becomes the byte
/// `0xXX`.
///
/// Malformed escapes are tolerated rather than rejected: a `%` that is not
/// followed by two hex digits is kept literally together with whatever
/// follows it. Decoded bytes that do not form valid UTF-8 are replaced
/// with `U+FFFD`; use [url_decode_bytes] for the exact bytes.
///
/// Returns a borrowed value when there is nothing to decode.
///
/// # Examples
/// ```
/// use maker_stream::query::url_decode;
///
/// assert_eq!(url_decode("hello%20world"), "hello world");
/// assert_eq!(url_decode("a+b"), "a b");
/// assert_eq!(url_decode("100%"), "100%");
/// assert_eq!(url_decode("%GG"), "%GG");
/// assert_eq!(url_decode("plain"), "plain");
/// ```
pub fn url_decode(src: &str) -> Cow<'_, str> {
    if memchr2(b'%', b'+', src.as_bytes()).is_none() {
        return Cow::Borrowed(src);
    }

    match String::from_utf8(url_decode_bytes(src.as_bytes())) {
        Ok(value) => Cow::Owned(value),
        Err(err) => Cow::Owned(String::from_utf8_lossy(err.as_bytes()).into_owned()),
    }
}

/// Byte-exact variant of [url_decode].
///
/// # Examples
/// ```
/// use maker_stream::query::url_decode_bytes;
///
/// assert_eq!(url_decode_bytes(b"%FF%41+"), b"\xFFA ");
/// assert_eq!(url_decode_bytes(b"%4"), b"%4");
/// ```
pub fn url_decode_bytes(src: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'+' => result.push(b' '),
            b'%' => match (src.get(i + 1), src.get(i + 2)) {
                (Some(&hi), Some(&lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                    result.push(hex_value(hi) << 4 | hex_value(lo));
                    i += 2;
                }
                _ => result.push(b'%'),
            },
            byte => result.push(byte),
        }
        i += 1;
    }

    result
}

#[inline(always)]
const fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        _ => byte - b'A' + 10,
    }
}

/// Parses a query string (the text after `?`) into decoded parameters.
///
/// The string is split on `&`, every segment on its first `=`. A segment
/// without `=` becomes a key with an empty value; for duplicate keys the
/// last one wins. There is no limit on the number of parameters, see
/// [Query::parse] for a bounded variant.
///
/// # Examples
/// ```
/// use maker_stream::query::parse_query_string;
///
/// let params = parse_query_string("q=hello%20world&sort=asc&debug&sort=desc");
/// assert_eq!(params.len(), 3);
/// assert_eq!(params["q"], "hello world");
/// assert_eq!(params["sort"], "desc");
/// assert_eq!(params["debug"], "");
/// ```
pub fn parse_query_string(query: &str) -> QueryParams {
    let mut result = QueryParams::new();
    Query::parse_into(&mut result, query, usize::MAX).unwrap_or_default();
    result
}

/// URL query string parser with flexible collection support.
///
/// Keys and values are percent-decoded with [url_decode] before they are
/// handed to the collector.
///
/// # Examples
/// ```rust
/// use maker_stream::query::Query;
/// use std::collections::HashMap;
///
/// // Parse into Vec (preserves order and duplicates)
/// let query = "name=john&age=25&city";
/// let vec_params: Vec<(String, String)> = Query::parse(query, 10).unwrap();
/// assert_eq!(vec_params.len(), 3);
///
/// // Parse into HashMap (deduplicates)
/// let hash_params: HashMap<String, String> = Query::parse(query, 10).unwrap();
/// assert_eq!(hash_params.len(), 3);
///
/// // Handle limits
/// let result = Query::parse::<Vec<(String, String)>>("a=1&b=2", 1);
/// assert!(result.is_err()); // Exceeds limit of 1 parameter
/// ```
/// All possible formats:
/// ```rust
/// use maker_stream::query::Query;
///
/// let params: Vec<(String, String)> = Query::parse("debug&name=&=Qwe&key=sda&&", 10).unwrap();
///
/// assert_eq!(params.len(), 5);
/// assert_eq!(params[0], ("debug".into(), "".into()));
/// assert_eq!(params[1], ("name".into(), "".into()));
/// assert_eq!(params[2], ("".into(), "Qwe".into()));
/// assert_eq!(params[3], ("key".into(), "sda".into()));
/// assert_eq!(params[4], ("".into(), "".into()));
/// ```
pub struct Query;

impl Query {
    /// Parses a query string into a new collection.
    ///
    /// # Arguments
    /// - `query`: the query string, without the leading `?`
    /// - `limit`: maximum number of parameters to parse
    #[inline(always)]
    pub fn parse<C: QueryCollector>(query: &str, limit: usize) -> Result<C, Error> {
        let mut result = C::with_capacity(limit.min(16));
        Self::parse_into(&mut result, query, limit)?;
        Ok(result)
    }

    /// Parses a query string into an existing collection.
    ///
    /// # Examples
    /// ```
    /// use maker_stream::query::Query;
    ///
    /// let mut collector = Vec::new();
    ///
    /// Query::parse_into(&mut collector, "a=1&b=2", 10).unwrap();
    /// Query::parse_into(&mut collector, "c=3&email=user%40example.com", 10).unwrap();
    /// assert_eq!(collector.len(), 4); // parameters are appended
    /// assert_eq!(collector[3].1, "user@example.com");
    ///
    /// let mut collector = Vec::new();
    /// let result = Query::parse_into(&mut collector, "a=1&b=2&c=3", 2);
    /// assert!(result.is_err()); // limit exceeded after 2 parameters
    /// ```
    #[inline]
    pub fn parse_into<C: QueryCollector>(
        result: &mut C,
        query: &str,
        limit: usize,
    ) -> Result<(), Error> {
        let data = query.as_bytes();
        let mut count = 0;
        let mut start = 0;

        while start < data.len() {
            if count >= limit {
                return Err(Error::OverLimit(limit));
            }

            // `&` and `=` are ASCII, so every split point is a char boundary
            let end = memchr(b'&', &data[start..])
                .map(|pos| start + pos)
                .unwrap_or(data.len());

            let segment = &query[start..end];
            let (key, value) = match memchr(b'=', segment.as_bytes()) {
                Some(index) => (&segment[..index], &segment[index + 1..]),
                None => (segment, ""),
            };

            result.add_param(url_decode(key).into_owned(), url_decode(value).into_owned());
            count += 1;
            start = end + 1;
        }

        Ok(())
    }
}

/// A trait for types that can collect parsed query parameters.
///
/// # Examples
/// ```rust
/// use maker_stream::query::{Query, QueryCollector};
///
/// struct Keys(Vec<String>);
///
/// impl QueryCollector for Keys {
///     fn add_param(&mut self, key: String, _: String) {
///         self.0.push(key);
///     }
///
///     fn with_capacity(capacity: usize) -> Self {
///         Keys(Vec::with_capacity(capacity))
///     }
/// }
///
/// let keys: Keys = Query::parse("a=1&b%20c=2", 8).unwrap();
/// assert_eq!(keys.0, ["a", "b c"]);
/// ```
pub trait QueryCollector
where
    Self: Sized,
{
    /// Adds a decoded parameter to the collection.
    fn add_param(&mut self, key: String, value: String);

    /// Creates a new collection with the specified capacity.
    fn with_capacity(capacity: usize) -> Self;
}

// Preserves parameter order
impl QueryCollector for Vec<(String, String)> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.push((key, value));
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }
}

// Deduplicates parameters (last wins)
impl QueryCollector for HashMap<String, String> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.insert(key, value);
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity(capacity)
    }
}

/// Error types that can occur during query parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The number of parameters exceeded the specified limit.
    ///
    /// # Fields
    /// - `0`: The maximum allowed number of parameters
    OverLimit(usize),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OverLimit(limit) => {
                write!(f, "Query parameter limit exceeded: limit={}", limit)
            }
        }
    }
}

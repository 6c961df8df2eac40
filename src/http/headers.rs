//! Header name normalization and value trimming

use crate::http::types;
use std::collections::HashMap;

/// Header map keyed by lower-case name. Duplicate names keep the last value.
pub type Headers = HashMap<String, String>;

/// Lower-cases the ASCII letters of a header name, other bytes are kept.
///
/// ```
/// use maker_stream::normalize_header_field;
///
/// assert_eq!(normalize_header_field("Content-Type"), "content-type");
/// assert_eq!(normalize_header_field("X-ÜBER"), "x-Über");
/// ```
#[inline]
pub fn normalize_header_field(name: &str) -> String {
    let mut bytes = name.as_bytes().to_vec();
    types::to_lower_case(&mut bytes);

    // Only ASCII bytes are rewritten, and always into ASCII
    String::from_utf8(bytes).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Strips leading and trailing whitespace.
///
/// Whitespace is the C `isspace` set: space, `\t`, `\n`, `\v`, `\f`, `\r`.
///
/// ```
/// use maker_stream::trim;
///
/// assert_eq!(trim(" \t value \r\n"), "value");
/// assert_eq!(trim("\x0Bkeep  inner\x0C"), "keep  inner");
/// assert_eq!(trim("   "), "");
/// ```
#[inline]
pub fn trim(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_ascii() && is_space(c as u8))
}

#[inline(always)]
pub(crate) const fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

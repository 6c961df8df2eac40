//! Byte-level HTTP/1.x request grammar.
//!
//! The engine walks the input once and reports spans to an [`Events`] sink
//! as soon as they are known. Spans may be split at any byte by the caller's
//! chunking, so the sink must concatenate them. The engine itself keeps only
//! what framing needs: the method token, the version digits and the
//! `Content-Length` and `Transfer-Encoding` values.

use crate::{
    errors::Error,
    http::{
        parser::State,
        types::{self, is_token},
    },
    limits::ReqLimits,
};

// Enough for a `usize` with surrounding whitespace
const MAX_LENGTH_VALUE: usize = 32;

/// Receiver of parse events.
///
/// For every header line `on_header_field` is called one or more times,
/// then `on_header_value` at least once (with an empty span if the value is
/// empty). A field span that follows a value span starts a new header.
pub(crate) trait Events {
    fn on_method(&mut self, token: &[u8]);
    fn on_url(&mut self, fragment: &[u8]);
    fn on_url_complete(&mut self) -> Result<(), Error>;
    fn on_header_field(&mut self, fragment: &[u8]);
    fn on_header_value(&mut self, fragment: &[u8]);
    fn on_headers_complete(&mut self, major: u8, minor: u8, content_length: Option<usize>);
    fn on_body(&mut self, chunk: &[u8]);
    fn on_message_complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    // Empty lines before the request line
    Start,
    StartLf,

    Method,
    Url,
    Version,
    RequestLineLf,

    LineStart,
    FieldName,
    FieldValue,
    ValueLf,
    Fold,
    HeadersLf,

    Body,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    None,
    ContentLength,
    TransferEncoding,
}

/// Case-insensitive match of a header name against the framing headers,
/// fed one span at a time.
#[derive(Debug, Clone, Copy)]
struct NameMatcher {
    len: usize,
    content_length: bool,
    transfer_encoding: bool,
}

impl NameMatcher {
    const CONTENT_LENGTH: &'static [u8] = b"content-length";
    const TRANSFER_ENCODING: &'static [u8] = b"transfer-encoding";

    #[inline(always)]
    const fn new() -> Self {
        Self {
            len: 0,
            content_length: true,
            transfer_encoding: true,
        }
    }

    #[inline]
    fn push(&mut self, fragment: &[u8]) {
        for &byte in fragment {
            let byte = byte.to_ascii_lowercase();

            self.content_length &= Self::CONTENT_LENGTH.get(self.len) == Some(&byte);
            self.transfer_encoding &= Self::TRANSFER_ENCODING.get(self.len) == Some(&byte);
            self.len += 1;
        }
    }

    #[inline]
    fn framing(&self) -> Framing {
        match (self.content_length, self.transfer_encoding, self.len) {
            (true, _, len) if len == Self::CONTENT_LENGTH.len() => Framing::ContentLength,
            (_, true, len) if len == Self::TRANSFER_ENCODING.len() => Framing::TransferEncoding,
            _ => Framing::None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Engine {
    step: Step,

    method: Vec<u8>,
    url_len: usize,
    version: [u8; 8],
    version_len: usize,
    major: u8,
    minor: u8,

    header_count: usize,
    field_len: usize,
    value_len: usize,
    matcher: NameMatcher,
    framing: Framing,
    framing_value: Vec<u8>,

    content_length: Option<usize>,
    remaining: usize,
}

impl Engine {
    pub(crate) fn new(limits: &ReqLimits) -> Self {
        Self {
            step: Step::Start,

            method: Vec::with_capacity(limits.method_size),
            url_len: 0,
            version: [0; 8],
            version_len: 0,
            major: 0,
            minor: 0,

            header_count: 0,
            field_len: 0,
            value_len: 0,
            matcher: NameMatcher::new(),
            framing: Framing::None,
            framing_value: Vec::with_capacity(MAX_LENGTH_VALUE),

            content_length: None,
            remaining: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.step = Step::Start;

        self.method.clear();
        self.url_len = 0;
        self.version = [0; 8];
        self.version_len = 0;
        self.major = 0;
        self.minor = 0;

        self.header_count = 0;
        self.field_len = 0;
        self.value_len = 0;
        self.matcher = NameMatcher::new();
        self.framing = Framing::None;
        self.framing_value.clear();

        self.content_length = None;
        self.remaining = 0;
    }

    pub(crate) fn state(&self) -> State {
        match self.step {
            Step::Start | Step::StartLf => State::Start,
            Step::Method | Step::Url | Step::Version | Step::RequestLineLf => State::RequestLine,
            Step::LineStart | Step::FieldName | Step::HeadersLf => State::HeaderField,
            Step::FieldValue | Step::ValueLf | Step::Fold => State::HeaderValue,
            Step::Body if self.content_length == Some(self.remaining) => State::HeadersComplete,
            Step::Body => State::Body,
            Step::Complete => State::MessageComplete,
            Step::Failed => State::Failed,
        }
    }

    /// Runs `data` through the grammar. Any error leaves the engine failed
    /// until [`Engine::reset`].
    pub(crate) fn execute<E: Events>(
        &mut self,
        data: &[u8],
        limits: &ReqLimits,
        events: &mut E,
    ) -> Result<(), Error> {
        if self.step == Step::Failed {
            return Err(Error::NeedsReset);
        }

        self.run(data, limits, events).map_err(|err| {
            self.step = Step::Failed;
            err
        })
    }

    fn run<E: Events>(
        &mut self,
        data: &[u8],
        limits: &ReqLimits,
        events: &mut E,
    ) -> Result<(), Error> {
        let mut i = 0;

        while i < data.len() {
            let byte = data[i];

            match self.step {
                Step::Start => match byte {
                    b'\r' => {
                        self.step = Step::StartLf;
                        i += 1;
                    }
                    _ if is_token(byte) => self.step = Step::Method,
                    _ => return Err(Error::InvalidMethod),
                },
                Step::StartLf => match byte {
                    b'\n' => {
                        self.step = Step::Start;
                        i += 1;
                    }
                    _ => return Err(Error::InvalidMethod),
                },

                Step::Method => {
                    let rest = &data[i..];
                    let end = span(rest, is_token);

                    if self.method.len() + end > limits.method_size {
                        return Err(Error::InvalidMethod);
                    }
                    self.method.extend_from_slice(&rest[..end]);
                    i += end;

                    match rest.get(end) {
                        Some(b' ') if !self.method.is_empty() => {
                            events.on_method(&self.method);
                            self.step = Step::Url;
                            i += 1;
                        }
                        Some(_) => return Err(Error::InvalidMethod),
                        None => {}
                    }
                }
                Step::Url => {
                    let rest = &data[i..];
                    let end = span(rest, is_url_byte);

                    self.url_len += end;
                    if self.url_len > limits.url_size {
                        return Err(Error::UriTooLong);
                    }
                    if end > 0 {
                        events.on_url(&rest[..end]);
                    }
                    i += end;

                    match rest.get(end) {
                        Some(b' ') if self.url_len > 0 => {
                            events.on_url_complete()?;
                            self.step = Step::Version;
                            i += 1;
                        }
                        Some(_) => return Err(Error::InvalidUrl),
                        None => {}
                    }
                }
                Step::Version => match byte {
                    b'\r' => {
                        self.finish_version()?;
                        self.step = Step::RequestLineLf;
                        i += 1;
                    }
                    _ if self.version_len < self.version.len() => {
                        self.version[self.version_len] = byte;
                        self.version_len += 1;
                        i += 1;
                    }
                    _ => return Err(Error::InvalidVersion),
                },
                Step::RequestLineLf => match byte {
                    b'\n' => {
                        self.step = Step::LineStart;
                        i += 1;
                    }
                    _ => return Err(Error::InvalidVersion),
                },

                Step::LineStart => match byte {
                    b'\r' => {
                        self.finish_header(limits)?;
                        self.step = Step::HeadersLf;
                        i += 1;
                    }
                    b' ' | b'\t' if self.header_count > 0 => {
                        self.step = Step::Fold;
                        i += 1;
                    }
                    _ if is_token(byte) => {
                        self.finish_header(limits)?;

                        self.header_count += 1;
                        if self.header_count > limits.header_count {
                            return Err(Error::TooManyHeaders);
                        }

                        self.field_len = 0;
                        self.value_len = 0;
                        self.matcher = NameMatcher::new();
                        self.step = Step::FieldName;
                    }
                    _ => return Err(Error::InvalidHeader),
                },
                Step::FieldName => {
                    let rest = &data[i..];
                    let end = span(rest, is_token);

                    self.field_len += end;
                    if self.field_len > limits.header_name_size {
                        return Err(Error::HeaderTooLarge);
                    }
                    if end > 0 {
                        self.matcher.push(&rest[..end]);
                        events.on_header_field(&rest[..end]);
                    }
                    i += end;

                    match rest.get(end) {
                        Some(b':') => {
                            self.framing = self.matcher.framing();
                            self.step = Step::FieldValue;
                            i += 1;
                        }
                        Some(_) => return Err(Error::InvalidHeader),
                        None => {}
                    }
                }
                Step::FieldValue => {
                    let rest = &data[i..];
                    let end = span(rest, is_value_byte);
                    let terminator = rest.get(end).copied();

                    self.push_value(&rest[..end], limits)?;
                    // The value is reported even when empty, so an empty
                    // header can't merge with the next field name
                    if end > 0 || terminator == Some(b'\r') {
                        events.on_header_value(&rest[..end]);
                    }
                    i += end;

                    match terminator {
                        Some(b'\r') => {
                            self.step = Step::ValueLf;
                            i += 1;
                        }
                        Some(_) => return Err(Error::InvalidHeader),
                        None => {}
                    }
                }
                Step::ValueLf => match byte {
                    b'\n' => {
                        self.step = Step::LineStart;
                        i += 1;
                    }
                    _ => return Err(Error::InvalidHeader),
                },
                Step::Fold => match byte {
                    b' ' | b'\t' => i += 1,
                    b'\r' => {
                        self.step = Step::ValueLf;
                        i += 1;
                    }
                    _ if is_value_byte(byte) => {
                        self.push_value(b" ", limits)?;
                        events.on_header_value(b" ");
                        self.step = Step::FieldValue;
                    }
                    _ => return Err(Error::InvalidHeader),
                },
                Step::HeadersLf => match byte {
                    b'\n' => {
                        i += 1;
                        events.on_headers_complete(self.major, self.minor, self.content_length);

                        match self.content_length {
                            Some(len) if len > 0 => {
                                self.remaining = len;
                                self.step = Step::Body;
                            }
                            _ => self.complete(events),
                        }
                    }
                    _ => return Err(Error::InvalidHeader),
                },

                Step::Body => {
                    let rest = &data[i..];
                    let take = rest.len().min(self.remaining);

                    events.on_body(&rest[..take]);
                    self.remaining -= take;
                    i += take;

                    if self.remaining == 0 {
                        self.complete(events);
                    }
                }
                Step::Complete => return Err(Error::UnexpectedData(data.len() - i)),
                Step::Failed => return Err(Error::NeedsReset),
            }
        }

        Ok(())
    }

    #[inline]
    fn complete<E: Events>(&mut self, events: &mut E) {
        events.on_message_complete();
        self.step = Step::Complete;
    }

    #[inline]
    fn finish_version(&mut self) -> Result<(), Error> {
        match &self.version[..self.version_len] {
            [b'H', b'T', b'T', b'P', b'/', major @ b'0'..=b'9', b'.', minor @ b'0'..=b'9'] => {
                self.major = *major - b'0';
                self.minor = *minor - b'0';
                Ok(())
            }
            _ => Err(Error::InvalidVersion),
        }
    }

    #[inline]
    fn push_value(&mut self, value: &[u8], limits: &ReqLimits) -> Result<(), Error> {
        self.value_len += value.len();
        if self.value_len > limits.header_value_size {
            return Err(Error::HeaderTooLarge);
        }

        match self.framing {
            Framing::None => {}
            Framing::ContentLength if self.framing_value.len() + value.len() > MAX_LENGTH_VALUE => {
                return Err(Error::InvalidContentLength);
            }
            _ => self.framing_value.extend_from_slice(value),
        }

        Ok(())
    }

    // Called once the next line proves the previous header has no more folds
    fn finish_header(&mut self, limits: &ReqLimits) -> Result<(), Error> {
        let framing = std::mem::replace(&mut self.framing, Framing::None);

        match framing {
            Framing::None => Ok(()),
            Framing::TransferEncoding => {
                // Other codings leave the body framed by `Content-Length`
                let chunked = self
                    .framing_value
                    .split(|&b| b == b',')
                    .any(|coding| trim_bytes(coding).eq_ignore_ascii_case(b"chunked"));
                self.framing_value.clear();

                if chunked {
                    return Err(Error::UnsupportedTransferEncoding);
                }
                Ok(())
            }
            Framing::ContentLength => {
                let len = types::slice_to_usize(trim_bytes(&self.framing_value))
                    .ok_or(Error::InvalidContentLength)?;
                self.framing_value.clear();

                match self.content_length {
                    Some(previous) if previous != len => Err(Error::InvalidContentLength),
                    _ if len > limits.body_size => Err(Error::BodyTooLarge),
                    _ => {
                        self.content_length = Some(len);
                        Ok(())
                    }
                }
            }
        }
    }
}

#[inline(always)]
fn span(data: &[u8], accept: fn(u8) -> bool) -> usize {
    data.iter()
        .position(|&byte| !accept(byte))
        .unwrap_or(data.len())
}

// Visible ASCII and anything non-ASCII
#[inline(always)]
fn is_url_byte(byte: u8) -> bool {
    byte > b' ' && byte != 0x7F
}

#[inline(always)]
fn is_value_byte(byte: u8) -> bool {
    byte == b'\t' || (byte >= b' ' && byte != 0x7F)
}

#[inline(always)]
fn trim_bytes(value: &[u8]) -> &[u8] {
    let start = value
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(value.len());
    let end = value
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t')
        .map_or(start, |i| i + 1);

    &value[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    // Records the event stream in a form that is easy to compare
    #[derive(Debug, Default, PartialEq)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Recorder {
        fn push(&mut self, kind: &str, data: &[u8]) {
            self.events
                .push(format!("{kind}:{}", String::from_utf8_lossy(data)));
        }
    }

    impl Events for Recorder {
        fn on_method(&mut self, token: &[u8]) {
            self.push("method", token);
        }
        fn on_url(&mut self, fragment: &[u8]) {
            self.push("url", fragment);
        }
        fn on_url_complete(&mut self) -> Result<(), Error> {
            self.push("url_complete", b"");
            Ok(())
        }
        fn on_header_field(&mut self, fragment: &[u8]) {
            self.push("field", fragment);
        }
        fn on_header_value(&mut self, fragment: &[u8]) {
            self.push("value", fragment);
        }
        fn on_headers_complete(&mut self, major: u8, minor: u8, content_length: Option<usize>) {
            self.events
                .push(format!("headers_complete:{major}.{minor}:{content_length:?}"));
        }
        fn on_body(&mut self, chunk: &[u8]) {
            self.push("body", chunk);
        }
        fn on_message_complete(&mut self) {
            self.push("complete", b"");
        }
    }

    fn run(chunks: &[&[u8]]) -> (Result<(), Error>, Vec<String>) {
        let limits = ReqLimits::default();
        let mut engine = Engine::new(&limits);
        let mut recorder = Recorder::default();

        for chunk in chunks {
            if let Err(err) = engine.execute(chunk, &limits, &mut recorder) {
                return (Err(err), recorder.events);
            }
        }

        (Ok(()), recorder.events)
    }

    #[test]
    fn event_order() {
        let (result, events) = run(&[b"POST /a?b HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\nhi"]);

        assert_eq!(result, Ok(()));
        #[rustfmt::skip]
        assert_eq!(events, [
            "method:POST",
            "url:/a?b", "url_complete:",
            "field:Host", "value: x",
            "field:Content-Length", "value: 2",
            "headers_complete:1.1:Some(2)",
            "body:hi",
            "complete:",
        ]);
    }

    #[test]
    fn fragments_follow_chunks() {
        let (result, events) = run(&[b"GET /se", b"arch HTTP/1.1\r\nHo", b"st: ex", b"ample\r\n\r\n"]);

        assert_eq!(result, Ok(()));
        #[rustfmt::skip]
        assert_eq!(events, [
            "method:GET",
            "url:/se", "url:arch", "url_complete:",
            "field:Ho", "field:st", "value: ex", "value:ample",
            "headers_complete:1.1:None",
            "complete:",
        ]);
    }

    #[test]
    fn empty_value_is_reported() {
        let (result, events) = run(&[b"GET / HTTP/1.0\r\nX-Empty:\r\nHost: x\r\n\r\n"]);

        assert_eq!(result, Ok(()));
        #[rustfmt::skip]
        assert_eq!(events[3..], [
            "field:X-Empty", "value:",
            "field:Host", "value: x",
            "headers_complete:1.0:None",
            "complete:",
        ]);
    }

    #[test]
    fn folded_value() {
        let (result, events) = run(&[b"GET / HTTP/1.1\r\nX: a\r\n  b\r\n\t\r\n\r\n"]);

        assert_eq!(result, Ok(()));
        #[rustfmt::skip]
        assert_eq!(events[3..], [
            "field:X", "value: a", "value: ", "value:b",
            "headers_complete:1.1:None",
            "complete:",
        ]);
    }

    #[test]
    fn state_mapping() {
        let limits = ReqLimits::default();
        let mut engine = Engine::new(&limits);
        let mut recorder = Recorder::default();

        #[rustfmt::skip]
        let steps: [(&[u8], State); 8] = [
            (b"",                    State::Start),
            (b"\r\nPO",              State::RequestLine),
            (b"ST / HTTP/1.1\r\n",   State::HeaderField),
            (b"Content-Length:",     State::HeaderValue),
            (b" 4\r\n",              State::HeaderField),
            (b"\r\n",                State::HeadersComplete),
            (b"ab",                  State::Body),
            (b"cd",                  State::MessageComplete),
        ];

        for (data, expected) in steps {
            assert_eq!(engine.execute(data, &limits, &mut recorder), Ok(()));
            assert_eq!(engine.state(), expected);
        }

        assert_eq!(
            engine.execute(b"x", &limits, &mut recorder),
            Err(Error::UnexpectedData(1))
        );
        assert_eq!(engine.state(), State::Failed);

        engine.reset();
        assert_eq!(engine.state(), State::Start);
    }

    #[test]
    fn name_matcher() {
        #[rustfmt::skip]
        let cases: [(&[&[u8]], Framing); 6] = [
            (&[b"Content-Length"],         Framing::ContentLength),
            (&[b"content-", b"LENGTH"],    Framing::ContentLength),
            (&[b"Transfer-Encoding"],      Framing::TransferEncoding),
            (&[b"Content-Length2"],        Framing::None),
            (&[b"Content"],                Framing::None),
            (&[b"Host"],                   Framing::None),
        ];

        for (fragments, expected) in cases {
            let mut matcher = NameMatcher::new();
            fragments.iter().for_each(|f| matcher.push(f));

            assert_eq!(matcher.framing(), expected);
        }
    }

    #[test]
    fn transfer_codings() {
        #[rustfmt::skip]
        let cases: [(&[&[u8]], Result<(), Error>); 6] = [
            (&[b"Transfer-Encoding: identity\r\n\r\n"],               Ok(())),
            (&[b"Transfer-Encoding: gzip\r\n\r\n"],                   Ok(())),
            (&[b"Transfer-Encoding: chunked\r\n\r\n"],                Err(Error::UnsupportedTransferEncoding)),
            (&[b"transfer-encoding: gzip, CHUNKED \r\n\r\n"],         Err(Error::UnsupportedTransferEncoding)),
            (&[b"Transfer-Encoding: gzip,\r\n chun", b"ked\r\n\r\n"], Err(Error::UnsupportedTransferEncoding)),
            (&[b"Transfer-Encoding: chunkedx\r\n\r\n"],               Ok(())),
        ];

        for (headers, expected) in cases {
            let mut chunks: Vec<&[u8]> = vec![b"GET / HTTP/1.1\r\n".as_slice()];
            chunks.extend_from_slice(headers);

            assert_eq!(run(&chunks).0, expected, "{headers:?}");
        }
    }

    #[test]
    fn trim_value() {
        assert_eq!(trim_bytes(b" \t12 "), b"12");
        assert_eq!(trim_bytes(b"   "), b"");
        assert_eq!(trim_bytes(b"7"), b"7");
    }
}

use crate::error::{Error, Result};
use crate::url::RequestTarget;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::str;

struct Parser<'a> {
    s: &'a str,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(s: &'a str) -> Self {
        Parser { s, position: 0 }
    }

    fn consume_whilespace(&mut self) {
        while self.position < self.s.len()
            && (self.s[self.position..].starts_with(' ')
                || self.s[self.position..].starts_with('\t'))
        {
            self.position += 1
        }
    }

    fn parse_token(&mut self) -> Result<&'a str> {
        if self.position >= self.s.len() {
            return Err(Error::UnexpectedEof("Expected token".into()));
        }

        let remaining = &self.s[self.position..];
        let token = remaining
            .split(|c| c == ' ' || c == '\t')
            .next()
            .unwrap_or(remaining);
        self.position += token.len();
        self.consume_whilespace();

        Ok(token)
    }
}


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct HttpVersion {
    major: u32,
    minor: u32,
}

impl HttpVersion {
    fn new(major: u32, minor: u32) -> Self {
        HttpVersion { major, minor }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

/// A three digit HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub fn is_error(self) -> bool {
        self.0 >= 400
    }

    /// Reads the status out of a line such as `HTTP/1.1 404 Not Found`.
    pub fn from_status_line(line: &str) -> Result<Self> {
        let mut parser = Parser::new(line);
        parser.parse_token()?;
        parser.parse_token()?.parse()
    }
}

impl str::FromStr for HttpStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::ParseError(format!(
                "Expected 3-digit status code, got '{}'",
                s
            )));
        }
        Ok(HttpStatus(s.parse()?))
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[derive(Debug, PartialEq, Eq)]
struct HttpHeader {
    key: String,
    value: String,
}

impl HttpHeader {
    fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        HttpHeader {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Headers in the order they were added, which is the order they go on the wire.
#[derive(Debug, PartialEq, Eq)]
struct HttpHeaders {
    headers: Vec<HttpHeader>,
}

impl HttpHeaders {
    fn new() -> Self {
        HttpHeaders { headers: vec![] }
    }

    fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.push(HttpHeader::new(key, value));
    }
}

impl fmt::Display for HttpHeaders {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for header in &self.headers {
            write!(f, "{}: {}\r\n", header.key, header.value)?;
        }
        Ok(())
    }
}


#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum HttpMethod {
    Get,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    uri: String,
    version: HttpVersion,
    headers: HttpHeaders,
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}\r\n", self.method, self.uri, self.version)?;
        write!(f, "{}", self.headers)?;
        write!(f, "\r\n")?;
        Ok(())
    }
}

impl HttpRequest {
    fn new<S: Into<String>>(method: HttpMethod, uri: S) -> Self {
        HttpRequest {
            method,
            uri: uri.into(),
            version: HttpVersion::new(1, 1),
            headers: HttpHeaders::new(),
        }
    }

    /// The request sent to every target: a bare GET asking the server to close the connection when done.
    pub fn get(target: &RequestTarget) -> Self {
        let mut request = HttpRequest::new(HttpMethod::Get, format!("/{}", target.path()));
        request.add_header("Host", target.authority());
        request.add_header("Connection", "Close");
        request
    }

    fn add_header<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.insert(key, value);
    }

    pub fn serialize<W: io::Write>(&self, mut w: W) -> Result<()> {
        w.write_all(self.to_string().as_bytes())?;
        w.flush()?;
        Ok(())
    }
}


const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const LINE_TERMINATOR: &[u8] = b"\r\n";

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// A response read until the peer closed the connection, split once on the first blank line.
#[derive(Debug, PartialEq, Eq)]
pub struct RawResponse<'a> {
    head: &'a [u8],
    body: &'a [u8],
}

impl<'a> RawResponse<'a> {
    /// Without a blank line the whole buffer counts as head and the body is empty.
    pub fn split(bytes: &'a [u8]) -> Self {
        match find(bytes, HEADER_TERMINATOR) {
            Some(pos) => RawResponse {
                head: &bytes[..pos],
                body: &bytes[(pos + HEADER_TERMINATOR.len())..],
            },
            None => RawResponse {
                head: bytes,
                body: &[],
            },
        }
    }

    pub fn status_line(&self) -> Cow<'a, str> {
        let head = self.head;
        let end = find(head, LINE_TERMINATOR).unwrap_or(head.len());
        String::from_utf8_lossy(&head[..end])
    }

    pub fn status(&self) -> Result<HttpStatus> {
        HttpStatus::from_status_line(&self.status_line())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(self.body).into_owned()
    }
}

#[cfg(test)]
mod raw_response_tests {
    use super::RawResponse;

    #[test]
    fn split_on_first_blank_line_only() {
        let raw = b"HTTP/1.1 200 OK\r\nA: B\r\n\r\nline one\r\n\r\nline two";
        let response = RawResponse::split(raw);
        assert_eq!(response.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(response.status().unwrap().to_string(), "200");
        assert_eq!(response.body_text(), "line one\r\n\r\nline two");
    }

    #[test]
    fn missing_blank_line_has_empty_body() {
        let response = RawResponse::split(b"HTTP/1.1 500 Internal Server Error\r\nA: B");
        assert_eq!(response.status().unwrap().to_string(), "500");
        assert_eq!(response.body_text(), "");
    }

    #[test]
    fn empty_response_is_malformed() {
        let response = RawResponse::split(b"");
        assert!(response.status().is_err());
    }

    #[test]
    fn non_utf8_body_is_lossy() {
        let response = RawResponse::split(b"HTTP/1.1 200 OK\r\n\r\n\xffok");
        assert_eq!(response.body_text(), "\u{fffd}ok");
    }
}

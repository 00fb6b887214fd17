//! One request cycle: dial, send the GET, read until the peer closes, classify.
//!
//! Every call opens its own connection and drops it before returning; nothing is
//! pooled or reused between calls.
use crate::error::{Error, Result};
use crate::protocol::{HttpRequest, RawResponse};
#[cfg(feature = "ssl")]
use crate::ssl::SslClientStream;
use crate::url::{RequestTarget, Scheme};
use std::io;
use std::net;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const READ_CHUNK_SIZE: usize = 256;

/// Represents the ability to open a fresh byte stream to a target.
pub trait Connector {
    type Stream: io::Read + io::Write;
    fn connect(&self, target: &RequestTarget) -> Result<Self::Stream>;
}

pub enum NetStream {
    Plain(net::TcpStream),
    #[cfg(feature = "ssl")]
    Tls(SslClientStream<net::TcpStream>),
}

impl io::Read for NetStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NetStream::Plain(s) => s.read(buf),
            #[cfg(feature = "ssl")]
            NetStream::Tls(s) => s.read(buf),
        }
    }
}

impl io::Write for NetStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            NetStream::Plain(s) => s.write(buf),
            #[cfg(feature = "ssl")]
            NetStream::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            NetStream::Plain(s) => s.flush(),
            #[cfg(feature = "ssl")]
            NetStream::Tls(s) => s.flush(),
        }
    }
}

/// Dials over TCP and wraps `https` targets in TLS. Without a timeout every
/// step blocks for as long as the network does.
#[derive(Debug, Clone, Default)]
pub struct NetConnector {
    timeout: Option<Duration>,
}

impl NetConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds connect, each read and each write. `timeout` must be non-zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn dial(&self, target: &RequestTarget) -> Result<net::TcpStream> {
        let stream = match self.timeout {
            None => net::TcpStream::connect((target.host(), target.port()))?,
            Some(timeout) => {
                let err = || {
                    io::Error::new(
                        io::ErrorKind::AddrNotAvailable,
                        format!("Failed to lookup {}", target.host()),
                    )
                };
                let addrs = net::ToSocketAddrs::to_socket_addrs(&(target.host(), target.port()))?;
                let mut last_error = None;
                let mut connected = None;
                for addr in addrs {
                    match net::TcpStream::connect_timeout(&addr, timeout) {
                        Ok(s) => {
                            connected = Some(s);
                            break;
                        }
                        Err(e) => last_error = Some(e),
                    }
                }
                match connected {
                    Some(s) => s,
                    None => return Err(last_error.unwrap_or_else(err).into()),
                }
            }
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        Ok(stream)
    }
}

impl Connector for NetConnector {
    type Stream = NetStream;

    fn connect(&self, target: &RequestTarget) -> Result<NetStream> {
        let stream = self.dial(target)?;
        match target.scheme() {
            Scheme::Http => Ok(NetStream::Plain(stream)),
            #[cfg(feature = "ssl")]
            Scheme::Https => Ok(NetStream::Tls(SslClientStream::new(target.host(), stream)?)),
            #[cfg(not(feature = "ssl"))]
            Scheme::Https => Err(Error::SslUnavailable),
        }
    }
}

/// The result of one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// Wall clock time from just before dialing to the end of the read loop.
    pub elapsed_millis: u64,
    /// Every byte received, status line and headers included.
    pub body_byte_count: usize,
    /// The failing status code, or the text of the read/parse error.
    pub status_error_code: Option<String>,
    pub succeeded: bool,
    /// Only filled in when the caller asked for the body.
    pub raw_body: Option<String>,
}

impl RequestOutcome {
    /// A failed outcome for a dial that never produced a connection.
    pub fn dial_failure(elapsed_millis: u64, error: &Error) -> Self {
        RequestOutcome {
            elapsed_millis,
            body_byte_count: 0,
            status_error_code: Some(error.to_string()),
            succeeded: false,
            raw_body: None,
        }
    }

    /// The error code as displayed in a profile, empty for a success.
    pub fn error_code(&self) -> &str {
        self.status_error_code.as_deref().unwrap_or("")
    }
}

pub(crate) fn millis_since(start: Instant) -> u64 {
    let elapsed = start.elapsed().as_millis();
    if elapsed > u128::from(u64::MAX) {
        u64::MAX
    } else {
        elapsed as u64
    }
}

fn read_to_close<R: io::Read>(stream: &mut R, received: &mut Vec<u8>) -> io::Result<()> {
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => received.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

pub struct Requester<C: Connector> {
    connector: C,
}

impl<C: Connector> Requester<C> {
    pub fn new(connector: C) -> Self {
        Requester { connector }
    }

    /// Runs one request against `target`.
    ///
    /// Only a failed dial or TLS handshake is returned as `Err`. Read errors,
    /// unparsable status lines and statuses of 400 and above all come back as
    /// an outcome with `succeeded == false`.
    pub fn execute(&self, target: &RequestTarget, capture_body: bool) -> Result<RequestOutcome> {
        let start = Instant::now();
        debug!(host = target.host(), port = target.port(), "dialing");
        let mut stream = self
            .connector
            .connect(target)
            .map_err(|e| Error::ConnectFailed {
                authority: format!("{}:{}", target.host(), target.port()),
                cause: Box::new(e),
            })?;

        // A failed write shows up as a short or empty read below.
        if let Err(e) = HttpRequest::get(target).serialize(&mut stream) {
            warn!(error = %e, "failed to send request");
        }

        let mut received = Vec::with_capacity(4096);
        let read_result = read_to_close(&mut stream, &mut received);
        let elapsed_millis = millis_since(start);
        drop(stream);
        debug!(bytes = received.len(), elapsed_millis, "connection closed");

        if let Err(e) = read_result {
            warn!(error = %e, bytes = received.len(), "read error");
            return Ok(RequestOutcome {
                elapsed_millis,
                body_byte_count: received.len(),
                status_error_code: Some(e.to_string()),
                succeeded: false,
                raw_body: None,
            });
        }

        let response = RawResponse::split(&received);
        let (succeeded, status_error_code) = match response.status() {
            Ok(status) if status.is_error() => (false, Some(status.to_string())),
            Ok(_) => (true, None),
            Err(e) => {
                warn!(error = %e, line = %response.status_line(), "malformed status line");
                (false, Some(e.to_string()))
            }
        };

        Ok(RequestOutcome {
            elapsed_millis,
            body_byte_count: received.len(),
            status_error_code,
            succeeded,
            raw_body: if capture_body {
                Some(response.body_text())
            } else {
                None
            },
        })
    }
}

#[cfg(test)]
#[derive(Clone, Copy)]
pub(crate) enum Scripted {
    Respond(&'static str),
    FailAfter(&'static str, io::ErrorKind),
    InterruptFirst(&'static str),
    Refuse,
}

#[cfg(test)]
pub(crate) struct ScriptedStream {
    data: &'static [u8],
    fail_with: Option<io::ErrorKind>,
    interrupt: bool,
    sent: std::rc::Rc<std::cell::RefCell<Vec<u8>>>,
}

#[cfg(test)]
impl io::Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt {
            self.interrupt = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }
        if self.data.is_empty() {
            return match self.fail_with {
                Some(kind) => Err(io::Error::new(kind, "connection reset by peer")),
                None => Ok(0),
            };
        }
        // Hand out short reads so accumulation across chunks is exercised.
        let n = std::cmp::min(std::cmp::min(buf.len(), 7), self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[cfg(test)]
impl io::Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serves one scripted response per `connect`, in order.
#[cfg(test)]
pub(crate) struct ScriptedConnector {
    script: std::cell::RefCell<std::collections::VecDeque<Scripted>>,
    pub(crate) sent: std::rc::Rc<std::cell::RefCell<Vec<u8>>>,
}

#[cfg(test)]
impl ScriptedConnector {
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        ScriptedConnector {
            script: std::cell::RefCell::new(script.into()),
            sent: Default::default(),
        }
    }
}

#[cfg(test)]
impl Connector for ScriptedConnector {
    type Stream = ScriptedStream;

    fn connect(&self, _target: &RequestTarget) -> Result<ScriptedStream> {
        let (data, fail_with, interrupt) = match self.script.borrow_mut().pop_front() {
            Some(Scripted::Respond(data)) => (data, None, false),
            Some(Scripted::FailAfter(data, kind)) => (data, Some(kind), false),
            Some(Scripted::InterruptFirst(data)) => (data, None, true),
            Some(Scripted::Refuse) | None => {
                return Err(Error::IoError(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            }
        };
        Ok(ScriptedStream {
            data: data.as_bytes(),
            fail_with,
            interrupt,
            sent: self.sent.clone(),
        })
    }
}

#[cfg(test)]
impl Drop for ScriptedConnector {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            assert!(self.script.borrow().is_empty(), "unused scripted responses");
        }
    }
}

#[cfg(test)]
mod requester_tests {
    use super::*;

    const OK_RESPONSE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello world";

    fn target(path: &str) -> RequestTarget {
        RequestTarget::new(Scheme::Http, "example.com", path)
    }

    #[test]
    fn success_captures_body() {
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::Respond(
            OK_RESPONSE,
        )]));
        let outcome = requester.execute(&target(""), true).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.status_error_code, None);
        assert_eq!(outcome.error_code(), "");
        assert_eq!(outcome.body_byte_count, OK_RESPONSE.len());
        assert_eq!(outcome.raw_body.as_deref(), Some("hello world"));
    }

    #[test]
    fn body_not_captured_unless_asked() {
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::Respond(
            OK_RESPONSE,
        )]));
        let outcome = requester.execute(&target(""), false).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.raw_body, None);
    }

    #[test]
    fn sends_exact_request_text() {
        let connector = ScriptedConnector::new(vec![
            Scripted::Respond(OK_RESPONSE),
            Scripted::Respond(OK_RESPONSE),
        ]);
        let sent = connector.sent.clone();
        let requester = Requester::new(connector);

        requester.execute(&target(""), false).unwrap();
        assert_eq!(
            &sent.borrow()[..],
            &b"GET / HTTP/1.1\r\nHost: example.com\r\nConnection: Close\r\n\r\n"[..]
        );

        sent.borrow_mut().clear();
        requester.execute(&target("foo/bar"), false).unwrap();
        assert_eq!(
            &sent.borrow()[..],
            &b"GET /foo/bar HTTP/1.1\r\nHost: example.com\r\nConnection: Close\r\n\r\n"[..]
        );
    }

    #[test]
    fn status_399_succeeds() {
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::Respond(
            "HTTP/1.1 399 Whatever\r\n\r\n",
        )]));
        let outcome = requester.execute(&target(""), false).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.status_error_code, None);
    }

    #[test]
    fn status_400_fails_with_code() {
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::Respond(
            "HTTP/1.1 400 Bad Request\r\n\r\nnope",
        )]));
        let outcome = requester.execute(&target(""), true).unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.status_error_code.as_deref(), Some("400"));
        assert_eq!(outcome.raw_body.as_deref(), Some("nope"));
    }

    #[test]
    fn malformed_status_line_fails() {
        let requester = Requester::new(ScriptedConnector::new(vec![
            Scripted::Respond("garbage\r\n\r\nbody"),
            Scripted::Respond(""),
        ]));

        let outcome = requester.execute(&target(""), false).unwrap();
        assert!(!outcome.succeeded);
        assert!(outcome.status_error_code.is_some());

        let outcome = requester.execute(&target(""), false).unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.body_byte_count, 0);
        assert!(outcome.status_error_code.is_some());
    }

    #[test]
    fn read_error_keeps_partial_byte_count() {
        let partial = "HTTP/1.1 200 OK\r\nContent-Len";
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::FailAfter(
            partial,
            io::ErrorKind::ConnectionReset,
        )]));
        let outcome = requester.execute(&target(""), true).unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.body_byte_count, partial.len());
        assert_eq!(
            outcome.status_error_code.as_deref(),
            Some("connection reset by peer")
        );
        assert_eq!(outcome.raw_body, None);
    }

    #[test]
    fn interrupted_read_is_retried() {
        let response = "HTTP/1.1 200 OK\r\n\r\nhi";
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::InterruptFirst(
            response,
        )]));
        let outcome = requester.execute(&target(""), true).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.status_error_code, None);
        assert_eq!(outcome.body_byte_count, response.len());
        assert_eq!(outcome.raw_body.as_deref(), Some("hi"));
    }

    #[test]
    fn reads_past_many_chunks() {
        let body = "x".repeat(READ_CHUNK_SIZE * 3 + 11);
        let response: &'static str =
            Box::leak(format!("HTTP/1.1 200 OK\r\n\r\n{}", body).into_boxed_str());
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::Respond(response)]));
        let outcome = requester.execute(&target(""), true).unwrap();
        assert_eq!(outcome.body_byte_count, response.len());
        assert_eq!(outcome.raw_body.as_deref(), Some(body.as_str()));
    }

    #[test]
    fn refused_dial_is_an_error() {
        let requester = Requester::new(ScriptedConnector::new(vec![Scripted::Refuse]));
        match requester.execute(&target(""), false) {
            Err(Error::ConnectFailed { authority, .. }) => assert_eq!(authority, "example.com:80"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dial_failure_outcome() {
        let error = Error::UnsupportedScheme("ftp".into());
        let outcome = RequestOutcome::dial_failure(12, &error);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.elapsed_millis, 12);
        assert_eq!(outcome.body_byte_count, 0);
        assert_eq!(outcome.error_code(), error.to_string());
    }
}

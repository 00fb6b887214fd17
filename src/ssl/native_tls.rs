use super::{Error, Result};
use std::{fmt, io};

/// A TLS session layered over `Stream`, verified against the system trust store.
pub struct SslClientStream<Stream>(native_tls::TlsStream<Stream>);

impl<Stream: io::Read + io::Write + fmt::Debug + 'static> SslClientStream<Stream> {
    pub fn new(host: &str, stream: Stream) -> Result<Self> {
        let connector = native_tls::TlsConnector::builder().build()?;
        Ok(Self(connector.connect(host, stream)?))
    }
}

impl<Stream: io::Read + io::Write> io::Read for SslClientStream<Stream> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<Stream: io::Read + io::Write> io::Write for SslClientStream<Stream> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

// This required 'static bound here is super weird
impl<Stream: fmt::Debug + 'static> From<native_tls::HandshakeError<Stream>> for Error {
    fn from(e: native_tls::HandshakeError<Stream>) -> Self {
        Self(e.to_string())
    }
}

impl From<native_tls::Error> for Error {
    fn from(e: native_tls::Error) -> Self {
        Self(e.to_string())
    }
}

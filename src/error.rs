use std::convert;
use std::error;
use std::fmt;
use std::io;
use std::num;

#[derive(Debug)]
pub enum Error {
    ParseError(String),
    ParseIntError(num::ParseIntError),
    IoError(io::Error),
    UnexpectedEof(String),
    UnsupportedScheme(String),
    SslUnavailable,
    #[cfg(feature = "ssl")]
    SslError(crate::ssl::Error),
    ConnectFailed { authority: String, cause: Box<Error> },
}

pub type Result<R> = std::result::Result<R, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(s) => write!(f, "{}", s),
            Error::ParseIntError(e) => write!(f, "{}", e),
            Error::IoError(e) => write!(f, "{}", e),
            Error::UnexpectedEof(s) => write!(f, "unexpected end of input: {}", s),
            Error::UnsupportedScheme(s) => write!(
                f,
                "unsupported scheme '{}', please specify scheme as either http: or https: in URL",
                s
            ),
            Error::SslUnavailable => write!(f, "https requires the ssl-native-tls feature"),
            #[cfg(feature = "ssl")]
            Error::SslError(e) => write!(f, "{}", e),
            Error::ConnectFailed { authority, cause } => {
                write!(f, "failed to connect to {}: {}", authority, cause)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::ParseError(_) => None,
            Error::ParseIntError(e) => Some(e),
            Error::IoError(e) => Some(e),
            Error::UnexpectedEof(_) => None,
            Error::UnsupportedScheme(_) => None,
            Error::SslUnavailable => None,
            #[cfg(feature = "ssl")]
            Error::SslError(e) => Some(e),
            Error::ConnectFailed { cause, .. } => Some(cause.as_ref()),
        }
    }
}

impl convert::From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl convert::From<num::ParseIntError> for Error {
    fn from(e: num::ParseIntError) -> Self {
        Error::ParseIntError(e)
    }
}

impl convert::From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::ParseError(e.to_string())
    }
}

#[cfg(feature = "ssl")]
impl convert::From<crate::ssl::Error> for Error {
    fn from(e: crate::ssl::Error) -> Self {
        Error::SslError(e)
    }
}

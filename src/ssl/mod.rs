use std::{error, fmt};

#[derive(Debug)]
pub struct Error(String);

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tls: {}", self.0)
    }
}

impl error::Error for Error {}

#[cfg(feature = "native-tls")]
#[path = "native_tls.rs"]
mod inner;

pub use inner::*;

//! Decomposition of a target URL into the host, port and path the requester dials.
use crate::error::{Error, Result};
use std::str;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl str::FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_ref() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            s => Err(Error::UnsupportedScheme(s.into())),
        }
    }
}

/// Where a request goes. `path` never carries the leading `/`.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct RequestTarget {
    scheme: Scheme,
    host: String,
    port: u16,
    path: String,
}

impl RequestTarget {
    pub fn new<H: Into<String>, P: Into<String>>(scheme: Scheme, host: H, path: P) -> Self {
        RequestTarget {
            scheme,
            host: host.into(),
            port: scheme.default_port(),
            path: path.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The `Host` header value: the bare host unless a non-default port is in use.
    pub fn authority(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl str::FromStr for RequestTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let url = url::Url::parse(s)?;
        let scheme: Scheme = url.scheme().parse()?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::ParseError(format!("URL '{}' has no host", s)))?;

        let path = url.path();
        let mut path = path.strip_prefix('/').unwrap_or(path).to_owned();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        let target = RequestTarget::new(scheme, host, path);
        Ok(match url.port() {
            Some(port) => target.with_port(port),
            None => target,
        })
    }
}

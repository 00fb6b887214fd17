//! A minimal HTTP request timer and profiler built on hand-written HTTP/1.1 framing.
//!
//! See the `client` module for a single request/response cycle.
//! See the `profile` module for repeated requests and their statistics.
//! See the `url` module for turning a URL into a request target.

pub mod client;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod report;
pub mod url;

#[cfg(feature = "ssl")]
pub mod ssl;

// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! A static file HTTP server that records the `User-Agent` of its clients.
//!
//! Serving the current directory on port 8000 is done by calling the [`start`](fn.start.html)
//! function:
//!
//! ```no_run
//! ua_http_server::start(ua_http_server::DEFAULT_PORT).unwrap();
//! ```
//!
//! Every request is answered with the content of the directory (a file, an index page or a
//! directory listing, see [the `assets` module](assets/index.html)) and then produces one line
//! of access log:
//!
//! ```text
//! "GET /index.html HTTP/1.1" <TestClient/1.0> 200 200
//! ```
//!
//! # Custom logging
//!
//! The access log goes through the `log` crate by default. In order to do something else with
//! it, build a [`Server`](struct.Server.html) with your own
//! [`RequestLogger`](log/trait.RequestLogger.html):
//!
//! ```no_run
//! use ua_http_server::Server;
//! use ua_http_server::log::AccessLogEntry;
//!
//! let server = Server::new("localhost:0", ".", |entry: &AccessLogEntry| {
//!     eprintln!("{}", entry);
//! }).unwrap();
//! server.run();
//! ```

#![deny(unsafe_code)]

pub use crate::error::Error;
pub use crate::response::{Response, ResponseBody};
pub use crate::server::Server;

use std::net::SocketAddr;
use std::slice::Iter as SliceIter;

use percent_encoding::percent_decode;

pub mod assets;
pub mod log;

mod error;
mod response;
mod server;

/// Port used by the `ua-http-server` binary.
pub const DEFAULT_PORT: u16 = 8000;

/// Serves the current directory on every interface, on the given port.
///
/// This function blocks and handles requests one after the other. Each request is logged with
/// [`StdLogger`](log/struct.StdLogger.html).
///
/// # Errors
///
/// Returns an error if the current directory can't be determined or if the port can't be
/// listened on, for example because it is already in use. Otherwise this function only returns
/// if the listening socket is closed.
pub fn start(port: u16) -> Result<(), Error> {
    let root = std::env::current_dir()?;
    let server = Server::new(format!("0.0.0.0:{}", port), root, crate::log::StdLogger)?;

    ::log::info!("Serving HTTP on {} from {}", server.server_addr(), server.root().display());
    server.run();
    Ok(())
}

/// Represents a request that the server must answer to.
///
/// This can be either a real request (received by the HTTP server) or a mock object created with
/// `fake_http`.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    url: String,
    http_version: (u8, u8),
    headers: Vec<(String, String)>,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Builds a fake HTTP/1.1 request to be used during tests.
    ///
    /// The remote address of the client will be `127.0.0.1:12345`.
    pub fn fake_http<U, M>(method: M, url: U, headers: Vec<(String, String)>) -> Request
        where U: Into<String>, M: Into<String>
    {
        Request {
            method: method.into(),
            url: url.into(),
            http_version: (1, 1),
            headers,
            remote_addr: Some(SocketAddr::from(([127, 0, 0, 1], 12345))),
        }
    }

    /// Returns the method of the request (`GET`, `HEAD`, etc.).
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the raw URL requested by the client. It is not decoded and thus can contain strings
    /// such as `%20`, and the query parameters such as `?p=hello`.
    ///
    /// # Example
    ///
    /// ```
    /// use ua_http_server::Request;
    ///
    /// let request = Request::fake_http("GET", "/hello%20world?foo=bar", vec![]);
    /// assert_eq!(request.raw_url(), "/hello%20world?foo=bar");
    /// ```
    #[inline]
    pub fn raw_url(&self) -> &str {
        &self.url
    }

    /// Returns the decoded path requested by the client.
    ///
    /// Contrary to `raw_url`, special characters have been decoded and the query string
    /// (eg `?p=hello`) and fragment have been removed. Non-unicode characters are replaced with
    /// `U+FFFD`.
    ///
    /// # Example
    ///
    /// ```
    /// use ua_http_server::Request;
    ///
    /// let request = Request::fake_http("GET", "/hello%20world?foo=bar", vec![]);
    /// assert_eq!(request.url(), "/hello world");
    /// ```
    pub fn url(&self) -> String {
        let url = self.url.as_bytes();
        let url = match url.iter().position(|&c| c == b'?' || c == b'#') {
            Some(pos) => &url[..pos],
            None => url,
        };

        percent_decode(url).decode_utf8_lossy().into_owned()
    }

    /// Returns the HTTP version as `(major, minor)`.
    #[inline]
    pub fn http_version(&self) -> (u8, u8) {
        self.http_version
    }

    /// Returns the request line, eg. `GET /index.html HTTP/1.1`.
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/{}.{}", self.method, self.url, self.http_version.0,
                self.http_version.1)
    }

    /// Returns the value of a header of the request. The name is case-insensitive.
    ///
    /// Returns `None` if no such header could be found.
    #[inline]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }

    /// Returns the `User-Agent` declared by the client, if any.
    #[inline]
    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent")
    }

    /// Returns a list of all the headers of the request.
    #[inline]
    pub fn headers(&self) -> HeadersIter<'_> {
        HeadersIter { iter: self.headers.iter() }
    }

    /// Returns the address of the client that made this request, if known.
    #[inline]
    pub fn remote_addr(&self) -> Option<&SocketAddr> {
        self.remote_addr.as_ref()
    }
}

/// Iterator to the list of headers in a request.
#[derive(Debug, Clone)]
pub struct HeadersIter<'a> {
    iter: SliceIter<'a, (String, String)>,
}

impl<'a> Iterator for HeadersIter<'a> {
    type Item = (&'a str, &'a str);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for HeadersIter<'a> {}

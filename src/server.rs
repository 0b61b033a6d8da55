// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::fmt;
use std::io;
use std::io::Read;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, warn};

use crate::assets;
use crate::log::{format_time, AccessLogEntry, RequestLogger};
use crate::Error;
use crate::Request;
use crate::Response;

/// A listening server.
///
/// The server answers every request with the content of its root directory, then hands an
/// [`AccessLogEntry`](log/struct.AccessLogEntry.html) to its logger. Requests are processed one
/// at a time, in the order in which they arrive.
///
/// The `start` function is just a shortcut for `Server::new` followed with `run`.
///
/// # Example
///
/// ```no_run
/// use ua_http_server::Server;
/// use ua_http_server::log::StdLogger;
///
/// let server = Server::new("localhost:0", "/srv/www", StdLogger).unwrap();
/// println!("Listening on {:?}", server.server_addr());
/// server.run();
/// ```
pub struct Server<L> {
    server: tiny_http::Server,
    local_addr: SocketAddr,
    root: PathBuf,
    logger: L,
}

impl<L> Server<L> where L: RequestLogger {
    /// Builds a new `Server` object serving the content of `root`.
    ///
    /// After this function returns, the HTTP server is listening.
    ///
    /// Returns an error if there was an error while creating the listening socket, for example if
    /// the port is already in use.
    pub fn new<A, P>(addr: A, root: P, logger: L) -> Result<Server<L>, Error>
        where A: ToSocketAddrs + fmt::Display,
              P: Into<PathBuf>
    {
        let addr_text = addr.to_string();

        let server = tiny_http::Server::http(addr).map_err(|source| Error::Bind {
            addr: addr_text.clone(),
            source,
        })?;

        let local_addr = match server.server_addr().to_ip() {
            Some(addr) => addr,
            None => {
                return Err(Error::Bind {
                    addr: addr_text,
                    source: Box::new(io::Error::new(io::ErrorKind::InvalidInput,
                                                    "not an IP socket")),
                })
            }
        };

        Ok(Server {
            server,
            local_addr,
            root: root.into(),
            logger,
        })
    }

    /// Returns the address of the listening socket.
    #[inline]
    pub fn server_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the directory whose content is served.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs the server forever, or until the listening socket is somehow force-closed by the
    /// operating system.
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            self.process(request);
        }
    }

    /// Processes all the client requests waiting to be processed, then returns.
    pub fn poll(&self) {
        while let Ok(Some(request)) = self.server.try_recv() {
            self.process(request);
        }
    }

    // Answers one request from tiny-http, then logs it.
    fn process(&self, request: tiny_http::Request) {
        let start_time = Instant::now();

        let version = request.http_version();
        let rq = Request {
            method: request.method().as_str().to_owned(),
            url: request.url().to_owned(),
            http_version: (version.0, version.1),
            headers: request.headers().iter()
                            .map(|h| (h.field.to_string(), h.value.to_string()))
                            .collect(),
            remote_addr: request.remote_addr().copied(),
        };

        let root = &self.root;
        let response = answer(&rq, |rq| assets::serve_directory(rq, root));

        let status = response.status_code;
        let sent = Arc::new(AtomicU64::new(0));

        let (res_data, res_len) = response.data.into_reader_and_size();
        let body = CountingReader { inner: res_data, count: sent.clone() };
        let mut tiny_response = tiny_http::Response::new(tiny_http::StatusCode(status), Vec::new(),
                                                         body, res_len, None);

        // A body of known length is always sent with `Content-Length`, never chunked.
        if res_len.is_some() {
            tiny_response = tiny_response.with_chunked_threshold(usize::MAX);
        }

        for (key, value) in response.headers {
            if key.eq_ignore_ascii_case("Content-Length") {
                continue;
            }

            match tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()) {
                Ok(header) => tiny_response.add_header(header),
                Err(()) => warn!("dropping invalid response header {:?}", key),
            }
        }

        // The body is only read while it is written to the socket, so the counter holds the
        // number of bytes actually sent once `respond` returns.
        if let Err(err) = request.respond(tiny_response) {
            warn!("failed to send the response to {}: {}", rq.request_line(), err);
        }

        let entry = AccessLogEntry {
            request_line: rq.request_line(),
            user_agent: rq.user_agent().map(|ua| ua.to_owned()),
            status,
            size: sent.load(Ordering::Acquire),
            remote_addr: rq.remote_addr,
            elapsed: start_time.elapsed(),
        };

        self.logger.log_request(&entry);
        debug!("{} answered in {}", entry.request_line, format_time(entry.elapsed));
    }
}

// Calls the handler. If it panics, a 500 page is returned instead.
fn answer<F>(rq: &Request, handler: F) -> Response where F: FnOnce(&Request) -> Response {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(rq))) {
        Ok(r) => r,
        Err(_) => {
            error!("panic while answering {}", rq.request_line());
            Response::error(500, "")
        }
    }
}

// Body of a response that counts the bytes read out of it.
struct CountingReader {
    inner: Box<dyn Read + Send>,
    count: Arc<AtomicU64>,
}

impl Read for CountingReader {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Release);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::{answer, CountingReader, Server};
    use crate::log::AccessLogEntry;
    use crate::{Error, Request, Response};

    #[test]
    fn handler_panic_becomes_500() {
        let request = Request::fake_http("GET", "/boom", vec![]);
        let response = answer(&request, |_| -> Response { panic!("handler failure") });

        assert_eq!(response.status_code, 500);
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));

        let (mut reader, len) = response.data.into_reader_and_size();
        let mut body = String::new();
        reader.read_to_string(&mut body).unwrap();
        assert_eq!(len, Some(body.len()));
        assert!(body.contains("Error code: 500"));
    }

    #[test]
    fn handler_result_is_passed_through() {
        let request = Request::fake_http("GET", "/", vec![]);
        let response = answer(&request, |rq| Response::redirect_301(format!("{}x", rq.raw_url())));
        assert_eq!(response.status_code, 301);
        assert_eq!(response.header("Location"), Some("/x"));
    }

    #[test]
    fn counting_reader() {
        let count = Arc::new(AtomicU64::new(0));
        let mut reader = CountingReader {
            inner: Box::new(Cursor::new(vec![7u8; 300])),
            count: count.clone(),
        };

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out.len(), 300);
        assert_eq!(count.load(Ordering::Acquire), 300);
    }

    #[test]
    fn port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let result = Server::new(addr, ".", |_: &AccessLogEntry| ());
        match result {
            Err(Error::Bind { addr: a, .. }) => assert_eq!(a, addr.to_string()),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("bound twice to {}", addr),
        }
    }

    #[test]
    fn reports_local_addr() {
        let server = Server::new("127.0.0.1:0", ".", |_: &AccessLogEntry| ()).unwrap();
        assert!(server.server_addr().port() != 0);
        assert!(server.server_addr().ip().is_loopback());
    }
}

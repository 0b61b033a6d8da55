// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Access log of the server.
//!
//! Each request handled by the [`Server`](../struct.Server.html) produces one
//! [`AccessLogEntry`](struct.AccessLogEntry.html), which is handed to a
//! [`RequestLogger`](trait.RequestLogger.html) once the response has been written.
//!
//! The line of an entry looks like this:
//!
//! ```text
//! "GET /index.html HTTP/1.1" <TestClient/1.0> 200 200
//! ```

use std::fmt;
use std::fmt::Write;
use std::net::SocketAddr;
use std::time::Duration;

use log::info;

/// Marker written in place of the user agent when the client didn't send one.
pub const ABSENT_USER_AGENT: &str = "-";

/// Target used by `StdLogger` for the access lines.
pub const ACCESS_TARGET: &str = "ua_http_server::access";

/// Formats one access log line.
///
/// The result has the shape `"<request-line>" <<user-agent>> <status> <size>`. A missing user
/// agent is written as `-`.
///
/// # Example
///
/// ```
/// use ua_http_server::log::format_log_line;
///
/// let line = format_log_line("GET /index.html HTTP/1.1", Some("TestClient/1.0"), 200, 200);
/// assert_eq!(line, r#""GET /index.html HTTP/1.1" <TestClient/1.0> 200 200"#);
///
/// let line = format_log_line("GET /missing.txt HTTP/1.1", None, 404, 335);
/// assert_eq!(line, r#""GET /missing.txt HTTP/1.1" <-> 404 335"#);
/// ```
pub fn format_log_line(request_line: &str, user_agent: Option<&str>, status: u16, size: u64)
                       -> String
{
    format!("\"{}\" <{}> {} {}", request_line, user_agent.unwrap_or(ABSENT_USER_AGENT), status,
            size)
}

/// Everything that is known about a request once it has been answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    /// The request line as sent by the client, eg. `GET / HTTP/1.1`.
    pub request_line: String,
    /// Value of the `User-Agent` header, if any.
    pub user_agent: Option<String>,
    /// Status code of the response.
    pub status: u16,
    /// Number of bytes of body written to the client.
    pub size: u64,
    /// Address of the client, if known.
    pub remote_addr: Option<SocketAddr>,
    /// Time between the reception of the request and the end of the response.
    pub elapsed: Duration,
}

impl AccessLogEntry {
    /// Returns the formatted access line of this entry.
    #[inline]
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AccessLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format_log_line(&self.request_line, self.user_agent.as_deref(), self.status,
                                     self.size))
    }
}

/// Objects that receive the access log of the server.
///
/// Any `Fn(&AccessLogEntry)` is a `RequestLogger`, which makes it easy to collect entries in
/// tests:
///
/// ```
/// use std::sync::mpsc::channel;
/// use ua_http_server::log::{AccessLogEntry, RequestLogger};
///
/// let (tx, rx) = channel();
/// let logger = move |entry: &AccessLogEntry| { let _ = tx.send(entry.line()); };
/// # let _ = (&logger, rx);
/// ```
pub trait RequestLogger {
    /// Logs a request that has been answered.
    fn log_request(&self, entry: &AccessLogEntry);
}

impl<F> RequestLogger for F where F: Fn(&AccessLogEntry) {
    #[inline]
    fn log_request(&self, entry: &AccessLogEntry) {
        self(entry)
    }
}

/// Writes the access log through the `log` crate.
///
/// Lines are written at the `info` level with the `ua_http_server::access` target, prefixed with
/// the IP address of the client.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl RequestLogger for StdLogger {
    fn log_request(&self, entry: &AccessLogEntry) {
        let client = entry.remote_addr.map(|addr| addr.ip().to_string());
        let client = client.as_deref().unwrap_or("-");

        info!(target: ACCESS_TARGET, "{} - - {}", client, entry);
    }
}

/// Formats a duration with a unit adapted to its magnitude, eg. `1.5ms`.
pub fn format_time(duration: Duration) -> String {
    let mut out = String::new();

    let secs_part = match duration.as_secs().checked_mul(1_000_000_000) {
        Some(v) => v,
        None => {
            let _ = write!(out, "{}s", duration.as_secs() as f64);
            return out;
        }
    };

    let duration_in_ns = secs_part + duration.subsec_nanos() as u64;

    let _ = if duration_in_ns < 1_000 {
        write!(out, "{}ns", duration_in_ns)
    } else if duration_in_ns < 1_000_000 {
        write!(out, "{:.1}us", duration_in_ns as f64 / 1_000.0)
    } else if duration_in_ns < 1_000_000_000 {
        write!(out, "{:.1}ms", duration_in_ns as f64 / 1_000_000.0)
    } else {
        write!(out, "{:.1}s", duration_in_ns as f64 / 1_000_000_000.0)
    };

    out
}

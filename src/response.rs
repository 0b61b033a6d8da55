// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::fs::File;
use std::io;
use std::io::Cursor;
use std::io::Read;

/// Contains a prototype of a response.
///
/// The response is only sent to the client once the server is done with it, which means that
/// a `Response` can be freely built and modified beforehand.
pub struct Response {
    /// The status code to return to the user.
    pub status_code: u16,

    /// List of headers to be returned in the response.
    ///
    /// `Content-Length` is ignored from this list, the length of the body is used instead.
    pub headers: Vec<(String, String)>,

    /// An opaque type that contains the body of the response.
    pub data: ResponseBody,
}

impl Response {
    /// Builds a `Response` that permanently redirects the user to another URL.
    ///
    /// # Example
    ///
    /// ```
    /// use ua_http_server::Response;
    /// let response = Response::redirect_301("/docs/");
    /// assert_eq!(response.status_code, 301);
    /// ```
    #[inline]
    pub fn redirect_301<S>(target: S) -> Response where S: Into<String> {
        Response {
            status_code: 301,
            headers: vec![("Location".to_owned(), target.into())],
            data: ResponseBody::empty(),
        }
    }

    /// Builds a `Response` that outputs HTML.
    #[inline]
    pub fn html<D>(content: D) -> Response where D: Into<Vec<u8>> {
        Response {
            status_code: 200,
            headers: vec![("Content-Type".to_owned(), "text/html; charset=utf-8".to_owned())],
            data: ResponseBody::from_data(content),
        }
    }

    /// Builds an HTML error page for the given status code.
    ///
    /// The page names the code, the message and a short explanation of the code.
    ///
    /// # Example
    ///
    /// ```
    /// use ua_http_server::Response;
    /// let response = Response::error(404, "File not found");
    /// assert_eq!(response.status_code, 404);
    /// assert!(response.data.len().unwrap() > 0);
    /// ```
    pub fn error(code: u16, message: &str) -> Response {
        let (reason, explain) = status_text(code);
        let message = if message.is_empty() { reason } else { message };

        let page = format!("<!DOCTYPE html>\n\
                            <html>\n\
                            <head>\n\
                            <title>Error response</title>\n\
                            </head>\n\
                            <body>\n\
                            <h1>Error response</h1>\n\
                            <p>Error code: {code}</p>\n\
                            <p>Message: {message}.</p>\n\
                            <p>Error code explanation: {code} - {explain}.</p>\n\
                            </body>\n\
                            </html>\n",
                           code = code, message = escape_html(message), explain = explain);

        Response::html(page).with_status_code(code)
    }

    /// Changes the status code of the response.
    ///
    /// # Example
    ///
    /// ```
    /// use ua_http_server::Response;
    /// let response = Response::html("<h1>oops</h1>").with_status_code(500);
    /// ```
    #[inline]
    pub fn with_status_code(mut self, code: u16) -> Response {
        self.status_code = code;
        self
    }

    /// Adds a header to the response.
    #[inline]
    pub fn with_header<K, V>(mut self, key: K, value: V) -> Response
        where K: Into<String>, V: Into<String>
    {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Returns the value of the first header named `key`, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }
}

/// An opaque type that represents the body of a response.
///
/// # Example
///
/// ```
/// use ua_http_server::ResponseBody;
/// let body = ResponseBody::from_data("hello world");
/// assert_eq!(body.len(), Some(11));
/// ```
pub struct ResponseBody {
    data: Box<dyn Read + Send>,
    data_length: Option<usize>,
}

impl ResponseBody {
    /// Extracts the content of the response.
    #[inline]
    pub fn into_reader_and_size(self) -> (Box<dyn Read + Send>, Option<usize>) {
        (self.data, self.data_length)
    }

    /// Returns the length of the body, if known in advance.
    #[inline]
    pub fn len(&self) -> Option<usize> {
        self.data_length
    }

    /// Returns true if the body is known to be empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data_length == Some(0)
    }

    /// Builds a `ResponseBody` that doesn't return any data.
    #[inline]
    pub fn empty() -> ResponseBody {
        ResponseBody {
            data: Box::new(io::empty()),
            data_length: Some(0),
        }
    }

    /// Builds a new `ResponseBody` that returns the given data.
    #[inline]
    pub fn from_data<D>(data: D) -> ResponseBody where D: Into<Vec<u8>> {
        let data = data.into();
        let len = data.len();

        ResponseBody {
            data: Box::new(Cursor::new(data)),
            data_length: Some(len),
        }
    }

    /// Builds a new `ResponseBody` that returns the content of the given file.
    ///
    /// The length is read from the metadata of the file.
    #[inline]
    pub fn from_file(file: File) -> ResponseBody {
        let len = file.metadata().map(|metadata| metadata.len() as usize).ok();

        ResponseBody {
            data: Box::new(file),
            data_length: len,
        }
    }
}

/// Escapes the characters that have a meaning in HTML.
pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

// Reason phrase and explanation for the status codes this server produces.
fn status_text(code: u16) -> (&'static str, &'static str) {
    match code {
        400 => ("Bad Request", "Bad request syntax or unsupported method"),
        403 => ("Forbidden", "Request forbidden -- authorization will not help"),
        404 => ("Not Found", "Nothing matches the given URI"),
        500 => ("Internal Server Error", "Server got itself in trouble"),
        501 => ("Not Implemented", "Server does not support this operation"),
        _ => ("Error", "Unexpected error"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::{escape_html, Response, ResponseBody};

    fn body_string(response: Response) -> String {
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn error_page_contents() {
        let response = Response::error(404, "File not found");
        assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));

        let len = response.data.len();
        let body = body_string(response);
        assert_eq!(len, Some(body.len()));
        assert!(body.contains("Error code: 404"));
        assert!(body.contains("Message: File not found."));
        assert!(body.contains("Nothing matches the given URI"));
    }

    #[test]
    fn error_page_escapes_message() {
        let body = body_string(Response::error(501, "Unsupported method ('<X>')"));
        assert!(body.contains("Unsupported method (&#x27;&lt;X&gt;&#x27;)"));
    }

    #[test]
    fn error_page_default_message() {
        let body = body_string(Response::error(500, ""));
        assert!(body.contains("Message: Internal Server Error."));
    }

    #[test]
    fn redirect_location() {
        let response = Response::redirect_301("/dir/?q=1");
        assert_eq!(response.header("Location"), Some("/dir/?q=1"));
        assert!(response.data.is_empty());
    }

    #[test]
    fn body_lengths() {
        assert_eq!(ResponseBody::empty().len(), Some(0));
        assert_eq!(ResponseBody::from_data(vec![1u8, 2, 3]).len(), Some(3));
        assert_eq!(ResponseBody::from_data("héllo").len(), Some(6));
    }

    #[test]
    fn escape() {
        assert_eq!(escape_html("a&b<c>\"d\""), "a&amp;b&lt;c&gt;&quot;d&quot;");
    }
}

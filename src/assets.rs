// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::fs;
use std::fs::File;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::response::escape_html;
use crate::Request;
use crate::Response;
use crate::ResponseBody;

/// Files that are served instead of a listing when a directory is requested.
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

// Characters left as-is in the links of a directory listing.
const LINK_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Answers a request with the content of the `root` directory.
///
/// - Only `GET` and `HEAD` are supported, other methods get a 501 response.
/// - If the URL matches a file, the file is returned with a `Content-Type` guessed from its
///   extension and a `Last-Modified` header.
/// - If the URL matches a directory, its `index.html` or `index.htm` is returned if there is one,
///   otherwise an HTML listing of the directory. A directory requested without a trailing `/` is
///   redirected to the same URL with a trailing `/`.
/// - Otherwise a 404 error page is returned.
///
/// The path of the URL is never allowed to leave `root`. Segments such as `..` are ignored.
///
/// # Example
///
/// ```no_run
/// use ua_http_server::{assets, Request};
///
/// let request = Request::fake_http("GET", "/index.html", vec![]);
/// let response = assets::serve_directory(&request, ".");
/// ```
pub fn serve_directory<P>(request: &Request, root: P) -> Response where P: AsRef<Path> {
    let method = request.method();
    if method != "GET" && method != "HEAD" {
        return Response::error(501, &format!("Unsupported method ('{}')", method));
    }

    let url = request.url();
    let path = translate_path(&url, root.as_ref());

    if path.is_dir() {
        if !url.ends_with('/') {
            return Response::redirect_301(with_trailing_slash(request.raw_url()));
        }

        for index in INDEX_FILES.iter() {
            let index = path.join(index);
            if index.exists() {
                return serve_file(&index);
            }
        }

        return list_directory(&path, &url);
    }

    if url.ends_with('/') {
        return Response::error(404, "File not found");
    }

    serve_file(&path)
}

/// Turns the decoded path of a URL into a path inside `root`.
///
/// Empty segments, `.`, `..` and segments that aren't a plain file name are skipped.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use ua_http_server::assets::translate_path;
///
/// let path = translate_path("/a/../../b/./c.txt", Path::new("/srv"));
/// assert_eq!(path, Path::new("/srv/a/b/c.txt"));
/// ```
pub fn translate_path(url_path: &str, root: &Path) -> PathBuf {
    let mut path = root.to_path_buf();

    for segment in url_path.split('/') {
        let mut components = Path::new(segment).components();
        if let (Some(Component::Normal(name)), None) = (components.next(), components.next()) {
            path.push(name);
        }
    }

    path
}

// Inserts a `/` between the path and the query string of a raw URL.
fn with_trailing_slash(raw_url: &str) -> String {
    match raw_url.find(|c: char| c == '?' || c == '#') {
        Some(pos) => format!("{}/{}", &raw_url[..pos], &raw_url[pos..]),
        None => format!("{}/", raw_url),
    }
}

fn serve_file(path: &Path) -> Response {
    // Opening a directory succeeds on some platforms, but it can't be sent.
    if path.is_dir() {
        return Response::error(404, "File not found");
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            debug!("cannot open {}: {}", path.display(), err);
            return Response::error(404, "File not found");
        }
    };

    let last_modified = file.metadata().and_then(|m| m.modified()).ok();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    let mut response = Response {
        status_code: 200,
        headers: vec![("Content-Type".to_owned(), content_type.to_string())],
        data: ResponseBody::from_file(file),
    };

    if let Some(time) = last_modified {
        response = response.with_header("Last-Modified", http_date(time));
    }

    response
}

fn list_directory(dir: &Path, display_path: &str) -> Response {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("cannot list {}: {}", dir.display(), err);
            return Response::error(404, "No permission to list directory");
        }
    };

    let mut entries: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry))
        .collect();
    entries.sort_by_key(|(name, _)| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut page = format!("<!DOCTYPE HTML>\n\
                            <html lang=\"en\">\n\
                            <head>\n\
                            <meta charset=\"utf-8\">\n\
                            <title>{title}</title>\n\
                            </head>\n\
                            <body>\n\
                            <h1>{title}</h1>\n\
                            <hr>\n\
                            <ul>\n", title = title);

    for (name, entry) in entries {
        let is_symlink = entry.file_type().map(|t| t.is_symlink()).unwrap_or(false);

        let (mut display_name, link_name) = if entry.path().is_dir() {
            (format!("{}/", name), format!("{}/", name))
        } else {
            (name.clone(), name.clone())
        };
        if is_symlink {
            display_name = format!("{}@", name);
        }

        page.push_str(&format!("<li><a href=\"{}\">{}</a></li>\n",
                               utf8_percent_encode(&link_name, LINK_ENCODE_SET),
                               escape_html(&display_name)));
    }

    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Response::html(page)
}

/// Formats a time the way HTTP headers expect it, eg. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

// Copyright (c) 2016 The Rouille developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Errors that can happen while starting the server.
///
/// Errors that happen while answering a request never show up here. They are turned into an HTTP
/// error response instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The listening socket could not be created, for example because the port is already in use.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// The document root (the current directory) could not be determined.
    #[error("cannot determine the document root: {0}")]
    DocumentRoot(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;

    #[test]
    fn bind_display() {
        let err = Error::Bind {
            addr: "0.0.0.0:8000".to_owned(),
            source: Box::new(io::Error::new(io::ErrorKind::AddrInUse, "address in use")),
        };
        assert_eq!(err.to_string(), "failed to listen on 0.0.0.0:8000: address in use");
    }

    #[test]
    fn document_root_from_io() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "cannot determine the document root: gone");
    }
}

//! Unified error type.

use std::fmt;

use http::Method;

/// The error type returned by strata's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup failures: a route the radix tree rejects, binding to a port, or
/// accepting a connection.
#[derive(Debug)]
pub struct Error(Repr);

#[derive(Debug)]
enum Repr {
    Io(std::io::Error),
    Route {
        method: Method,
        path: String,
        source: matchit::InsertError,
    },
}

impl Error {
    pub(crate) fn route(method: Method, path: &str, source: matchit::InsertError) -> Self {
        Self(Repr::Route { method, path: path.to_owned(), source })
    }

    /// `true` when a route could not be registered (duplicate or conflicting
    /// method + path, malformed pattern).
    pub fn is_route(&self) -> bool {
        matches!(self.0, Repr::Route { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Io(e) => write!(f, "io: {e}"),
            Repr::Route { method, path, source } => {
                write!(f, "route `{method} {path}`: {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            Repr::Io(e) => Some(e),
            Repr::Route { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(Repr::Io(e))
    }
}

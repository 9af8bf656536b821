use std::fmt;

/// Problems loading or attaching a peripheral resource (disk image, ROM,
/// URL fetch). Distinct from [`anyhow::Error`] so call sites that want to
/// keep running (e.g. "drive empty, continue booting") can match on it
/// instead of downcasting.
#[derive(Debug)]
pub enum ResourceError {
    NotFound(String),
    Http(String),
    UnsupportedFormat(String),
    Io(std::io::Error),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound(uri) => write!(f, "resource not found: {uri}"),
            ResourceError::Http(msg) => write!(f, "http fetch failed: {msg}"),
            ResourceError::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
            ResourceError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err)
    }
}

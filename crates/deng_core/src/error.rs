//! Error types for the core library

use core::fmt;

use crate::thread::ThreadError;
use crate::uri::UriError;

/// The core error type
#[derive(Debug, Clone)]
pub enum Error {
    /// Malformed resource URI
    Uri(UriError),
    /// Main thread discipline violated
    Thread(ThreadError),
    /// Generic error with message
    Message(Box<str>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Uri(e) => write!(f, "URI error: {}", e),
            Error::Thread(e) => write!(f, "Thread error: {}", e),
            Error::Message(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Uri(e) => Some(e),
            Error::Thread(e) => Some(e),
            Error::Message(_) => None,
        }
    }
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

impl From<UriError> for Error {
    fn from(e: UriError) -> Self {
        Error::Uri(e)
    }
}

impl From<ThreadError> for Error {
    fn from(e: ThreadError) -> Self {
        Error::Thread(e)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Message(s.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Message(s.into_boxed_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: Error = UriError::EmptyPath.into();
        assert_eq!(err.to_string(), "URI error: URI has an empty path");

        let err: Error = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}

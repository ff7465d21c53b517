//! Main thread discipline
//!
//! Resource caches are not locked. Instead every mutating operation checks
//! that it runs on the thread that created the owning system. Worker threads
//! hand results back through channels and never touch the caches directly.

use core::fmt;
use std::thread::{self, ThreadId};

/// Raised when an operation restricted to the main thread runs elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadError {
    /// Operation that was attempted
    pub operation: &'static str,
    /// Name of the offending thread, if it has one
    pub thread_name: Option<Box<str>>,
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.thread_name {
            Some(name) => write!(
                f,
                "'{}' must run on the main thread (called from '{}')",
                self.operation, name
            ),
            None => write!(f, "'{}' must run on the main thread", self.operation),
        }
    }
}

impl std::error::Error for ThreadError {}

/// Records which thread owns a subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainThread {
    id: ThreadId,
}

impl MainThread {
    /// Adopt the calling thread as the main thread
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    /// Owning thread id
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Check if the calling thread is the main thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Fail with [`ThreadError`] when called from another thread
    pub fn check(&self, operation: &'static str) -> Result<(), ThreadError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(ThreadError {
                operation,
                thread_name: thread::current().name().map(Into::into),
            })
        }
    }
}

impl MainThread {
    /// Like [`check`](Self::check), but a violation panics in debug builds.
    /// Release builds hand the error back for the caller to report.
    pub fn assert_current(&self, operation: &'static str) -> Result<(), ThreadError> {
        let result = self.check(operation);
        if let Err(err) = &result {
            debug_assert!(false, "{}", err);
        }
        result
    }
}

impl Default for MainThread {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_on_owner_thread() {
        let main = MainThread::current();
        assert!(main.is_current());
        assert!(main.check("declare").is_ok());
    }

    #[test]
    fn test_check_on_worker_thread() {
        let main = MainThread::current();
        let result = std::thread::Builder::new()
            .name("busy-worker".into())
            .spawn(move || main.check("upload"))
            .unwrap()
            .join()
            .unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.operation, "upload");
        assert_eq!(err.thread_name.as_deref(), Some("busy-worker"));
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_assert_current_panics_off_thread_in_debug() {
        let main = MainThread::current();
        let joined = std::thread::spawn(move || main.assert_current("clear")).join();
        assert!(joined.is_err());
    }
}

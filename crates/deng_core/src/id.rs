//! Unique identifier generation
//!
//! Ids are handed out in increasing order starting at 1 and are never
//! recycled, so a stale id can never alias a newer resource.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// A unique, never-reused identifier. Zero is the null id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id(u32);

impl Id {
    /// The null id
    pub const NULL: Self = Self(0);

    /// Create an id from a raw value
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Check if this id is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Id(null)")
        } else {
            write!(f, "Id({})", self.0)
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Id {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Thread-safe id generator
pub struct IdGenerator {
    next: AtomicU32,
}

impl IdGenerator {
    /// Create a new generator. The first id handed out is 1.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Generate the next unique id
    pub fn next(&self) -> Id {
        Id(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Peek at the id the next call to [`IdGenerator::next`] will return
    pub fn peek(&self) -> Id {
        Id(self.next.load(Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("next", &self.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generator_is_monotonic() {
        let gen = IdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert!(a < b);
    }

    #[test]
    fn test_null_id() {
        assert!(Id::NULL.is_null());
        assert!(Id::default().is_null());
        assert!(!Id::new(7).is_null());
        assert_eq!(format!("{:?}", Id::NULL), "Id(null)");
    }
}

//! Resource URIs
//!
//! A resource is addressed by `scheme:path`, for example `Textures:STARTAN3`
//! or `Materials:flats/FLOOR0_1`. Both parts match case-insensitively; the
//! original spelling is kept for display.
//!
//! A URI may omit its scheme (`STARTAN3`), in which case lookups search
//! every scheme of the owning collection in registration order.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

/// Schemes shorter than this are rejected so `C:/doom` style paths are not
/// mistaken for a scheme.
pub const MIN_SCHEME_LENGTH: usize = 2;

/// Path separator
pub const SEPARATOR: char = '/';

/// URI parse errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    /// Path part is empty
    EmptyPath,
    /// Scheme is present but too short
    SchemeTooShort(Box<str>),
    /// Scheme contains characters other than alphanumerics, `-` and `_`
    InvalidScheme(Box<str>),
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::EmptyPath => write!(f, "URI has an empty path"),
            UriError::SchemeTooShort(s) => {
                write!(f, "scheme '{}' is shorter than {} characters", s, MIN_SCHEME_LENGTH)
            }
            UriError::InvalidScheme(s) => write!(f, "invalid scheme '{}'", s),
        }
    }
}

impl std::error::Error for UriError {}

/// A `/`-separated resource path. Equality and ordering are
/// case-insensitive.
#[derive(Clone)]
pub struct Path {
    text: Box<str>,
    key: Box<str>,
}

impl Path {
    /// Create a path. Backslashes are normalised to `/` and surrounding
    /// separators are trimmed.
    pub fn new(text: &str) -> Self {
        let normalized: String = text
            .trim()
            .replace('\\', "/")
            .trim_matches(SEPARATOR)
            .to_string();
        let key = normalized.to_lowercase();
        Self {
            text: normalized.into_boxed_str(),
            key: key.into_boxed_str(),
        }
    }

    /// Original spelling
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lower-cased lookup key
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check if the path is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterate over the segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.text.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Last segment (the symbolic name)
    pub fn last_segment(&self) -> &str {
        self.text.rsplit(SEPARATOR).next().unwrap_or("")
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Path {}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.text)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// A `scheme:path` resource address
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    scheme: Option<Box<str>>,
    path: Path,
}

impl ResourceUri {
    /// Build a URI from a scheme and a path
    pub fn new(scheme: &str, path: impl Into<Path>) -> Result<Self, UriError> {
        let path = path.into();
        if path.is_empty() {
            return Err(UriError::EmptyPath);
        }
        let scheme = scheme.trim();
        let scheme = if scheme.is_empty() {
            None
        } else {
            Some(validate_scheme(scheme)?)
        };
        Ok(Self { scheme, path })
    }

    /// Build a scheme-less URI
    pub fn from_path(path: impl Into<Path>) -> Result<Self, UriError> {
        Self::new("", path)
    }

    /// Parse `scheme:path` or a bare path
    pub fn parse(text: &str) -> Result<Self, UriError> {
        match text.split_once(':') {
            // A one-letter "scheme" is a drive letter, keep it in the path.
            Some((scheme, path)) if scheme.len() >= MIN_SCHEME_LENGTH => Self::new(scheme, path),
            Some((scheme, _)) if !scheme.is_empty() && scheme.len() < MIN_SCHEME_LENGTH
                && !is_drive_letter(scheme) =>
            {
                Err(UriError::SchemeTooShort(scheme.into()))
            }
            Some(("", path)) => Self::new("", path),
            _ => Self::new("", text),
        }
    }

    /// Scheme name, if any
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Check if the URI names a scheme
    pub fn has_scheme(&self) -> bool {
        self.scheme.is_some()
    }

    /// Path part
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of this URI with a different scheme
    pub fn with_scheme(&self, scheme: &str) -> Result<Self, UriError> {
        Self::new(scheme, self.path.clone())
    }
}

impl fmt::Debug for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceUri({})", self)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scheme {
            Some(scheme) => write!(f, "{}:{}", scheme, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

impl FromStr for ResourceUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalise a scheme name for use as a map key
pub fn scheme_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn validate_scheme(scheme: &str) -> Result<Box<str>, UriError> {
    if scheme.len() < MIN_SCHEME_LENGTH {
        return Err(UriError::SchemeTooShort(scheme.into()));
    }
    if !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(UriError::InvalidScheme(scheme.into()));
    }
    Ok(scheme.into())
}

fn is_drive_letter(s: &str) -> bool {
    s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic())
}

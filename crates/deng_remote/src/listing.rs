//! `ls-laR` listing parser
//!
//! An idgames mirror publishes its whole file tree as the gzipped output of
//! `ls -laR`: a `path:` header line per directory followed by one long-format
//! line per entry.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::GzDecoder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Listing errors
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Failed to decompress listing: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("Listing has no entries")]
    Empty,

    #[error("Bad listing pattern: {0}")]
    Pattern(String),
}

/// Date an entry was last modified. `ls` prints a time of day instead of the
/// year for recent files; those carry the listing's reference year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Modified {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl Modified {
    /// `YYYY.MM.DD`, the package version format
    pub fn version(&self) -> String {
        format!("{:04}.{:02}.{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for Modified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A file in the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Path from the listing root, `/`-separated, no leading slash
    pub path: String,
    pub size: u64,
    pub modified: Modified,
}

impl RemoteFile {
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Directory part of the path, empty at the root
    pub fn folder(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

/// A directory of the listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Folder {
    folders: BTreeMap<String, Folder>,
    files: BTreeMap<String, RemoteFile>,
}

impl Folder {
    pub fn folders(&self) -> impl Iterator<Item = (&str, &Folder)> {
        self.folders.iter().map(|(name, folder)| (name.as_str(), folder))
    }

    pub fn files(&self) -> impl Iterator<Item = &RemoteFile> {
        self.files.values()
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.get(name)
    }

    fn folder_mut(&mut self, path: &str) -> &mut Folder {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self, |folder, segment| folder.folders.entry(segment.to_string()).or_default())
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a RemoteFile>) {
        out.extend(self.files.values());
        for folder in self.folders.values() {
            folder.collect(out);
        }
    }
}

/// Parsed file tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    root: Folder,
    file_count: usize,
}

impl Listing {
    /// Decompress and parse a gzipped listing
    pub fn from_gzip(bytes: &[u8], reference_year: i32) -> Result<Self, ListingError> {
        let mut raw = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut raw)?;
        Self::parse(&String::from_utf8_lossy(&raw), reference_year)
    }

    /// Parse listing text
    pub fn parse(text: &str, reference_year: i32) -> Result<Self, ListingError> {
        let (header, entry) = patterns()?;
        let mut listing = Listing::default();
        let mut current = String::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');

            if let Some(caps) = entry.captures(line) {
                let name = &caps[6];
                if line.starts_with('d') {
                    if name != "." && name != ".." {
                        listing.root.folder_mut(&current).folder_mut(name);
                    }
                    continue;
                }

                let (Ok(size), Some(month), Ok(day)) =
                    (caps[2].parse::<u64>(), month_number(&caps[3]), caps[4].parse::<u8>())
                else {
                    skipped += 1;
                    continue;
                };
                let year_or_time = &caps[5];
                let year = if year_or_time.contains(':') {
                    reference_year
                } else {
                    year_or_time.parse().unwrap_or(reference_year)
                };

                let path = if current.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", current, name)
                };
                let file = RemoteFile {
                    path,
                    size,
                    modified: Modified { year, month, day },
                };
                listing.root.folder_mut(&current).files.insert(name.to_string(), file);
                listing.file_count += 1;
            } else if let Some(caps) = header.captures(line) {
                current = normalize_dir(&caps[1]);
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {} malformed listing entries", skipped);
        }
        if listing.file_count == 0 && listing.root.folders.is_empty() {
            return Err(ListingError::Empty);
        }
        Ok(listing)
    }

    pub fn root(&self) -> &Folder {
        &self.root
    }

    /// Number of files in the tree
    pub fn len(&self) -> usize {
        self.file_count
    }

    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Folder at a `/`-separated path
    pub fn folder(&self, path: &str) -> Option<&Folder> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(&self.root, |folder, segment| folder.folder(segment))
    }

    /// File at a `/`-separated path
    pub fn file(&self, path: &str) -> Option<&RemoteFile> {
        let (dir, name) = path.rsplit_once('/').unwrap_or(("", path));
        self.folder(dir)?.files.get(name)
    }

    /// Every file, folders depth-first in name order
    pub fn files(&self) -> Vec<&RemoteFile> {
        let mut out = Vec::with_capacity(self.file_count);
        self.root.collect(&mut out);
        out
    }
}

/// Directory header and entry line patterns, compiled once
fn patterns() -> Result<&'static (Regex, Regex), ListingError> {
    static PATTERNS: OnceLock<Result<(Regex, Regex), regex::Error>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let header = Regex::new(r"^(.*):$")?;
            let entry = Regex::new(
                r"^([-d])[rwxsStT-]{9}\s+\d+\s+\S+\s+\S+\s+(\d+)\s+(\w{3})\s+(\d+)\s+(\d{4}|\d\d:\d\d)\s+(.+)$",
            )?;
            Ok((header, entry))
        })
        .as_ref()
        .map_err(|err| ListingError::Pattern(err.to_string()))
}

/// `./levels/doom/` → `levels/doom`
fn normalize_dir(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('.')
        .trim_matches('/')
        .to_string()
}

fn month_number(name: &str) -> Option<u8> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let name = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|index| index as u8 + 1)
}

/// Current UTC year, the default reference year for time-stamped entries
pub fn current_year() -> i32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    year_from_days((secs / 86_400) as i64)
}

/// Civil year for a day count since 1970-01-01
fn year_from_days(days: i64) -> i32 {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    year as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
.:
total 12
drwxr-xr-x   5 ftp ftp  4096 Jan 10  2020 .
drwxr-xr-x   5 ftp ftp  4096 Jan 10  2020 levels
-rw-r--r--   1 ftp ftp   512 Mar  3 12:45 README

./levels:
drwxr-xr-x   5 ftp ftp  4096 Jan 10  2020 doom

./levels/doom/a-c:
-rw-r--r--   1 ftp ftp 123456 Jun 14  1999 av.zip
-rw-r--r--   1 ftp ftp   2048 Jun 14  1999 av.txt
this line is noise
";

    #[test]
    fn test_parse_tree() {
        let listing = Listing::parse(SAMPLE, 2024).unwrap();
        assert_eq!(listing.len(), 3);

        let av = listing.file("levels/doom/a-c/av.zip").unwrap();
        assert_eq!(av.size, 123_456);
        assert_eq!(av.modified, Modified { year: 1999, month: 6, day: 14 });
        assert_eq!(av.name(), "av.zip");
        assert_eq!(av.folder(), "levels/doom/a-c");

        assert!(listing.folder("levels/doom").is_some());
        assert!(listing.folder("levels/heretic").is_none());
    }

    #[test]
    fn test_time_entries_take_reference_year() {
        let listing = Listing::parse(SAMPLE, 2024).unwrap();
        let readme = listing.file("README").unwrap();
        assert_eq!(readme.modified.version(), "2024.03.03");
    }

    #[test]
    fn test_empty_listing() {
        assert!(matches!(Listing::parse("nothing here\n", 2024), Err(ListingError::Empty)));
    }

    #[test]
    fn test_year_from_days() {
        assert_eq!(year_from_days(0), 1970);
        assert_eq!(year_from_days(365), 1971);
        // 2000-02-29
        assert_eq!(year_from_days(11_016), 2000);
        // 2023-12-31 and 2024-01-01
        assert_eq!(year_from_days(19_722), 2023);
        assert_eq!(year_from_days(19_723), 2024);
        assert!(current_year() >= 2024);
    }
}

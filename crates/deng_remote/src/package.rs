//! Package identifiers for idgames files

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::listing::{Modified, RemoteFile};

/// Prefix of every idgames package id
pub const ID_PREFIX: &str = "idgames";

/// Extensions of files that are packages
pub const PACKAGE_EXTENSIONS: [&str; 5] = ["zip", "pk3", "wad", "deh", "lmp"];

/// A remote file known as a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// e.g. `idgames.levels.doom.av`
    pub id: String,
    /// `YYYY.MM.DD` from the modification date
    pub version: String,
    /// Path of the file on the mirror
    pub path: String,
    pub size: u64,
    pub modified: Modified,
}

impl PackageInfo {
    /// Package info for a listing file; `None` unless it is a package archive
    pub fn from_file(file: &RemoteFile) -> Option<Self> {
        if !is_package_archive(&file.path) {
            return None;
        }
        Some(Self {
            id: package_id(&file.path),
            version: file.modified.version(),
            path: file.path.clone(),
            size: file.size,
            modified: file.modified,
        })
    }

    /// `id_version`
    pub fn versioned_id(&self) -> String {
        format!("{}_{}", self.id, self.version)
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Directory segments that become tags (bucket folders excluded)
    pub fn categories(&self) -> Vec<String> {
        directory_segments(&self.path)
            .map(|segment| segment.to_lowercase())
            .collect()
    }
}

/// Whether a file name has one of the package extensions
pub fn is_package_archive(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| PACKAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Package id for a mirror path: `idgames.` + the directory segments (minus
/// alphabetical bucket folders) + the file stem, lower-cased, with anything
/// non-alphanumeric replaced by `_`
pub fn package_id(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);

    std::iter::once(ID_PREFIX)
        .chain(directory_segments(path))
        .chain(std::iter::once(stem))
        .map(sanitize)
        .collect::<Vec<_>>()
        .join(".")
}

/// Directory segments of `path` without bucket folders such as `a-c` or `0-9`
fn directory_segments(path: &str) -> impl Iterator<Item = &str> {
    let dir = path.rsplit_once('/').map_or("", |(dir, _)| dir);
    dir.split('/')
        .filter(|segment| !segment.is_empty() && !is_bucket_folder(segment))
}

/// `a-c`, `0-9` and the like
pub fn is_bucket_folder(segment: &str) -> bool {
    static BUCKET: OnceLock<Option<Regex>> = OnceLock::new();
    match BUCKET.get_or_init(|| Regex::new(r"^([a-zA-Z]-[a-zA-Z]|0-9)$").ok()) {
        Some(pattern) => pattern.is_match(segment),
        None => false,
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id_skips_buckets() {
        assert_eq!(package_id("levels/doom/a-c/av.zip"), "idgames.levels.doom.av");
        assert_eq!(package_id("levels/doom2/0-9/1monster.wad"), "idgames.levels.doom2.1monster");
        assert_eq!(package_id("combos/Hell-Revealed.ZIP"), "idgames.combos.hell_revealed");
    }

    #[test]
    fn test_bucket_folders() {
        assert!(is_bucket_folder("a-c"));
        assert!(is_bucket_folder("0-9"));
        assert!(!is_bucket_folder("doom"));
        assert!(!is_bucket_folder("a-cd"));
    }

    #[test]
    fn test_archive_extensions() {
        assert!(is_package_archive("x/y/z.PK3"));
        assert!(is_package_archive("demos/run.lmp"));
        assert!(!is_package_archive("x/y/z.txt"));
        assert!(!is_package_archive("README"));
    }

    #[test]
    fn test_versioned_id() {
        let file = RemoteFile {
            path: "levels/doom/a-c/av.zip".into(),
            size: 10,
            modified: Modified { year: 1999, month: 6, day: 4 },
        };
        let info = PackageInfo::from_file(&file).unwrap();
        assert_eq!(info.version, "1999.06.04");
        assert_eq!(info.versioned_id(), "idgames.levels.doom.av_1999.06.04");
        assert_eq!(info.categories(), vec!["levels", "doom"]);

        let text = RemoteFile {
            path: "levels/doom/a-c/av.txt".into(),
            ..file
        };
        assert!(PackageInfo::from_file(&text).is_none());
    }
}

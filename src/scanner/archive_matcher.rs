use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

/// Date-prefixed archive names. The extension match is case-sensitive.
pub const ARCHIVE_NAME_PATTERN: &str = r"^\d{4}_\d{2}_\d{2}.*\.(zip|rar)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

impl ArchiveKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "zip" => Some(Self::Zip),
            "rar" => Some(Self::Rar),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Rar => "rar",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub struct ArchiveMatcher {
    pattern: Regex,
}

impl ArchiveMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(ARCHIVE_NAME_PATTERN).expect("archive name pattern is valid"),
        }
    }

    pub fn is_candidate(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Builds an [`ArchiveFile`] when `path`'s file name is a candidate.
    pub fn match_path(&self, path: &Path) -> Option<ArchiveFile> {
        let name = path.file_name()?.to_str()?;
        if !self.is_candidate(name) {
            return None;
        }
        ArchiveFile::from_path(path.to_path_buf())
    }
}

impl Default for ArchiveMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A candidate archive found under a month folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub file_name: String,
    pub stem: String,
    pub kind: ArchiveKind,
}

impl ArchiveFile {
    fn from_path(path: PathBuf) -> Option<Self> {
        let kind = ArchiveKind::from_path(&path)?;
        let file_name = path.file_name()?.to_str()?.to_string();
        let stem = path.file_stem()?.to_str()?.to_string();

        Some(Self {
            path,
            file_name,
            stem,
            kind,
        })
    }

    /// The month folder holding the archive.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The `YYYY_MM_DD` prefix, when it names a real calendar day.
    pub fn date(&self) -> Option<NaiveDate> {
        let prefix = self.file_name.get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y_%m_%d").ok()
    }
}

use crate::error::{ArchSweepError, Result};
use crate::scanner::ArchiveKind;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SCRATCH_PREFIX: &str = ".archsweep-";

/// Decodes one archive format.
pub trait ArchiveCodec {
    /// Extracts every entry of `archive` into `destination`, keeping the
    /// entry tree. Returns the number of files written.
    fn extract_all(&self, archive: &Path, destination: &Path) -> Result<usize>;
}

pub struct ZipCodec;

impl ArchiveCodec for ZipCodec {
    fn extract_all(&self, archive_path: &Path, destination: &Path) -> Result<usize> {
        let file = fs::File::open(archive_path).map_err(|e| corrupt(archive_path, e))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| corrupt(archive_path, e))?;

        let mut count = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| corrupt(archive_path, e))?;

            let entry_path = match entry.enclosed_name() {
                Some(p) => p.to_path_buf(),
                None => {
                    tracing::warn!(
                        archive = %archive_path.display(),
                        entry = entry.name(),
                        "skipping entry with unsafe path"
                    );
                    continue;
                }
            };

            let output_path = destination.join(&entry_path);

            if entry.is_dir() {
                create_dir(&output_path)?;
                continue;
            }

            if let Some(parent) = output_path.parent() {
                create_dir(parent)?;
            }

            let mut outfile = fs::File::create(&output_path).map_err(|source| {
                ArchSweepError::Extraction {
                    path: output_path.clone(),
                    source,
                }
            })?;

            io::copy(&mut entry, &mut outfile).map_err(|source| {
                if source.kind() == io::ErrorKind::InvalidData {
                    corrupt(archive_path, source)
                } else {
                    ArchSweepError::Extraction {
                        path: output_path.clone(),
                        source,
                    }
                }
            })?;
            count += 1;
        }

        Ok(count)
    }
}

pub struct RarCodec;

impl ArchiveCodec for RarCodec {
    fn extract_all(&self, archive_path: &Path, destination: &Path) -> Result<usize> {
        let path_str = archive_path.to_str().ok_or_else(|| ArchSweepError::InvalidPath {
            path: format!("RAR path is not valid UTF-8: {}", archive_path.display()),
        })?;
        let dest_str = destination.to_str().ok_or_else(|| ArchSweepError::InvalidPath {
            path: format!("Scratch path is not valid UTF-8: {}", destination.display()),
        })?;

        rar::Archive::extract_all(path_str, dest_str, "").map_err(|e| {
            ArchSweepError::CorruptArchive {
                path: archive_path.to_path_buf(),
                message: format!("{e:?}"),
            }
        })?;

        let count = walkdir::WalkDir::new(destination)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();

        Ok(count)
    }
}

fn corrupt(path: &Path, error: impl std::fmt::Display) -> ArchSweepError {
    ArchSweepError::CorruptArchive {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ArchSweepError::Extraction {
        path: path.to_path_buf(),
        source,
    })
}

/// Temporary extraction directory for one archive.
///
/// Lives next to the archive so the flattener can rename files out of it
/// without crossing devices. The directory is removed on drop, so an
/// extraction that fails part-way leaves nothing behind.
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    pub fn create_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)
            .map_err(|source| ArchSweepError::DirectoryCreation {
                path: parent.to_path_buf(),
                source,
            })?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the whole scratch tree. A tree that is already gone is fine.
    pub fn remove(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArchSweepError::Flatten { path, source }),
        }
    }
}

/// Picks the codec for an archive from its extension.
pub struct Extractor {
    zip: Box<dyn ArchiveCodec>,
    rar: Box<dyn ArchiveCodec>,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            zip: Box::new(ZipCodec),
            rar: Box::new(RarCodec),
        }
    }

    pub fn with_codec(mut self, kind: ArchiveKind, codec: Box<dyn ArchiveCodec>) -> Self {
        match kind {
            ArchiveKind::Zip => self.zip = codec,
            ArchiveKind::Rar => self.rar = codec,
        }
        self
    }

    pub fn extract(&self, archive: &Path, scratch: &ScratchArea) -> Result<usize> {
        let extension = archive
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let kind = ArchiveKind::from_extension(extension).ok_or_else(|| {
            ArchSweepError::UnsupportedArchiveKind {
                path: archive.to_path_buf(),
                extension: extension.to_string(),
            }
        })?;

        let codec = match kind {
            ArchiveKind::Zip => &self.zip,
            ArchiveKind::Rar => &self.rar,
        };

        let files = codec.extract_all(archive, scratch.path())?;
        tracing::debug!(archive = %archive.display(), %kind, files, "extracted archive");
        Ok(files)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Paths of every regular file under `root`, for diagnostics and tests.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

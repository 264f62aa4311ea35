use crate::error::{ArchSweepError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The archive now lives at this path inside the backup folder.
    Moved(PathBuf),
    /// The backup folder already held this name; the source archive was deleted.
    DuplicateRemoved(PathBuf),
}

impl BackupOutcome {
    pub fn backup_path(&self) -> &Path {
        match self {
            BackupOutcome::Moved(path) | BackupOutcome::DuplicateRemoved(path) => path,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, BackupOutcome::DuplicateRemoved(_))
    }
}

/// Relocates processed archives into a company's backup folder.
///
/// A name that is already backed up counts as done: the source archive is
/// deleted rather than reported. This favours forward progress over keeping
/// the second copy. Every other failure leaves the archive where it is and
/// surfaces as [`ArchSweepError::BackupMove`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BackupMover;

impl BackupMover {
    pub fn new() -> Self {
        Self
    }

    pub fn move_to_backup(&self, archive: &Path, backup_dir: &Path) -> Result<BackupOutcome> {
        let file_name = archive.file_name().ok_or_else(|| ArchSweepError::InvalidPath {
            path: archive.display().to_string(),
        })?;
        let target = backup_dir.join(file_name);

        // fs::rename replaces an existing target on Unix, so check first.
        if fs::symlink_metadata(&target).is_ok() {
            return self.discard_duplicate(archive, backup_dir, target);
        }

        match fs::rename(archive, &target) {
            Ok(()) => {
                tracing::debug!(archive = %archive.display(), backup = %target.display(), "archive backed up");
                Ok(BackupOutcome::Moved(target))
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                self.discard_duplicate(archive, backup_dir, target)
            }
            Err(source) => Err(ArchSweepError::BackupMove {
                archive: archive.to_path_buf(),
                backup_dir: backup_dir.to_path_buf(),
                source,
            }),
        }
    }

    fn discard_duplicate(
        &self,
        archive: &Path,
        backup_dir: &Path,
        existing: PathBuf,
    ) -> Result<BackupOutcome> {
        fs::remove_file(archive).map_err(|source| ArchSweepError::BackupMove {
            archive: archive.to_path_buf(),
            backup_dir: backup_dir.to_path_buf(),
            source,
        })?;

        tracing::warn!(
            archive = %archive.display(),
            existing = %existing.display(),
            "archive already backed up, deleted the source copy"
        );
        Ok(BackupOutcome::DuplicateRemoved(existing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let month = temp_dir.path().join("Acme/2024/01");
        let backup = temp_dir.path().join("Acme/backup");
        fs::create_dir_all(&month).unwrap();
        fs::create_dir_all(&backup).unwrap();
        (temp_dir, month, backup)
    }

    #[test]
    fn test_moves_archive_preserving_name() {
        let (_temp_dir, month, backup) = setup();
        let archive = month.join("2024_01_15_report.zip");
        fs::write(&archive, b"zip").unwrap();

        let outcome = BackupMover::new().move_to_backup(&archive, &backup).unwrap();

        assert_eq!(outcome, BackupOutcome::Moved(backup.join("2024_01_15_report.zip")));
        assert!(!archive.exists());
        assert_eq!(fs::read(outcome.backup_path()).unwrap(), b"zip");
    }

    #[test]
    fn test_collision_removes_source_without_error() {
        let (_temp_dir, month, backup) = setup();
        let archive = month.join("2024_01_15_report.zip");
        fs::write(&archive, b"new").unwrap();
        fs::write(backup.join("2024_01_15_report.zip"), b"old").unwrap();

        let outcome = BackupMover::new().move_to_backup(&archive, &backup).unwrap();

        assert!(outcome.is_duplicate());
        assert!(!archive.exists());
        assert_eq!(fs::read(backup.join("2024_01_15_report.zip")).unwrap(), b"old");
    }

    #[test]
    fn test_other_failures_leave_archive_in_place() {
        let (_temp_dir, month, backup) = setup();
        let archive = month.join("2024_01_15_report.zip");
        fs::write(&archive, b"zip").unwrap();
        let missing_backup = backup.join("does/not/exist");

        let result = BackupMover::new().move_to_backup(&archive, &missing_backup);

        assert!(matches!(result, Err(ArchSweepError::BackupMove { .. })));
        assert!(archive.exists());
    }

    #[test]
    fn test_missing_source_is_a_move_failure() {
        let (_temp_dir, month, backup) = setup();
        let result = BackupMover::new().move_to_backup(&month.join("2024_01_15_gone.zip"), &backup);

        assert!(matches!(result, Err(ArchSweepError::BackupMove { .. })));
    }
}
